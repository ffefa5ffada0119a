//! CLI for the gwrank gateway ranker.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use gwrank_core::config::{self, GwrankConfig};

use commands::{run_best, run_campaign, run_completions, run_probe, run_rank};

/// Top-level CLI for gwrank.
#[derive(Debug, Parser)]
#[command(name = "gwrank")]
#[command(about = "gwrank: probe content gateways and rank them by weighted score", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/gwrank/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for a single `gwrank run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RunArgs {
    /// Content reference to probe (repeatable). Defaults to `content_refs` from config.
    #[arg(long = "cid", value_name = "REF")]
    pub cids: Vec<String>,
    /// Full passes over all content references.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub epochs: Option<u32>,
    /// Maximum probes in flight.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,
    /// Pause between epochs, in seconds.
    #[arg(long, value_name = "S")]
    pub cooldown_secs: Option<u64>,
    /// Per-probe timeout, in seconds.
    #[arg(long, value_name = "S", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

impl RunArgs {
    /// Applies the flags that were given on top of the loaded config.
    pub fn apply_to(&self, cfg: &mut GwrankConfig) {
        if let Some(epochs) = self.epochs {
            cfg.epochs = epochs;
        }
        if let Some(jobs) = self.jobs {
            cfg.max_concurrent_probes = jobs as usize;
        }
        if let Some(secs) = self.cooldown_secs {
            cfg.cooldown_secs = secs;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.probe_timeout_secs = secs;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe every known gateway for each content reference, over several epochs.
    Run(RunArgs),

    /// Show the current ranking from saved state.
    Rank {
        /// Only show the first N gateways.
        #[arg(long, value_name = "N")]
        top: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print content URLs on the best-ranked gateways.
    Best {
        /// Content reference to build URLs for (default: configured default).
        #[arg(long = "cid", value_name = "REF")]
        cid: Option<String>,
        /// Number of gateways.
        #[arg(long, default_value = "5", value_name = "N")]
        count: usize,
    },

    /// Probe one gateway once and print the measurement. Saved state is not touched.
    Probe {
        /// Gateway base URL, e.g. https://gateway.example.org
        endpoint: String,
        /// Content reference (default: configured default).
        #[arg(long = "cid", value_name = "REF")]
        cid: Option<String>,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => run_campaign(cfg, &args).await?,
            CliCommand::Rank { top, json } => run_rank(&cfg, top, json)?,
            CliCommand::Best { cid, count } => run_best(&cfg, cid.as_deref(), count)?,
            CliCommand::Probe { endpoint, cid } => run_probe(&cfg, &endpoint, cid.as_deref()).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
