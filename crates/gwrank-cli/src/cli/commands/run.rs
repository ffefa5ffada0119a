//! `gwrank run` – probe every gateway for each content reference over several epochs.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use gwrank_core::config::GwrankConfig;
use gwrank_core::orchestrator::{self, BatchFinished, BatchProgress, CampaignOutputs, CampaignPlan};
use gwrank_core::probe::CurlProbe;
use gwrank_core::rank::rank;
use gwrank_core::report::ReportWriter;
use gwrank_core::scoring::{ScoringEngine, ScoringParams};
use gwrank_core::table::{EndpointTable, SeedLists};
use tokio::sync::mpsc;

use crate::cli::RunArgs;

use super::rank::print_ranking;

const PROGRESS_INTERVAL_MS: u128 = 500;
const SHOWN_AFTER_RUN: usize = 10;

pub async fn run_campaign(mut cfg: GwrankConfig, args: &RunArgs) -> Result<()> {
    args.apply_to(&mut cfg);
    let paths = cfg.paths()?;
    let params = ScoringParams::from_config(&cfg.scoring());

    let seeds = SeedLists::read(&paths.primary_list, &paths.secondary_list);
    let mut table =
        EndpointTable::load_or_seed(&paths.state_file, &seeds, cfg.stale_endpoints, &params);
    if table.is_empty() {
        anyhow::bail!(
            "no gateways to probe: add base URLs (one per line) to {} or {}",
            paths.primary_list.display(),
            paths.secondary_list.display()
        );
    }

    let plan = CampaignPlan::from_config(&cfg, args.cids.clone());
    let (progress_tx, progress_rx) = mpsc::channel::<BatchProgress>(64);
    let (done_tx, done_rx) = mpsc::channel::<BatchFinished>(4);
    let outputs = CampaignOutputs {
        state_path: Some(paths.state_file.clone()),
        reports: Some(ReportWriter::new(&paths.report_dir)),
        top_n: cfg.report_top_n,
        batch_done: Some(done_tx),
    };
    let engine = ScoringEngine::new(params);
    let prober = Arc::new(CurlProbe::from_config(&cfg));

    let printer = tokio::spawn(print_events(progress_rx, done_rx));

    let result = orchestrator::run_campaign(
        &mut table,
        &engine,
        prober,
        &plan,
        &outputs,
        Some(&progress_tx),
    )
    .await;
    drop(progress_tx);
    drop(outputs);
    let _ = printer.await;

    println!("Overall ranking:");
    print_ranking(&rank(table.records()).into_iter().take(SHOWN_AFTER_RUN).collect::<Vec<_>>());
    println!();
    println!(
        "{} probe(s) in {} batch(es); reports in {}",
        result.probes,
        result.batches,
        paths.report_dir.display()
    );
    tracing::info!(
        probes = result.probes,
        failed = result.failed_probes,
        epochs = result.epochs_completed,
        "run completed"
    );
    Ok(())
}

/// Prints throttled progress lines and, after each batch, the top of the ranking.
async fn print_events(
    mut progress_rx: mpsc::Receiver<BatchProgress>,
    mut done_rx: mpsc::Receiver<BatchFinished>,
) {
    let mut last_print = Instant::now();
    let mut progress_open = true;
    let mut done_open = true;
    while progress_open || done_open {
        tokio::select! {
            biased;
            ev = progress_rx.recv(), if progress_open => match ev {
                Some(ev) => {
                    let now = Instant::now();
                    if now.duration_since(last_print).as_millis() >= PROGRESS_INTERVAL_MS || ev.is_last() {
                        println!("{}", progress_line(&ev));
                        last_print = now;
                    }
                }
                None => progress_open = false,
            },
            done = done_rx.recv(), if done_open => match done {
                Some(done) => {
                    println!();
                    println!("{}", batch_heading(&done));
                    print_ranking(&done.ranked[..done.ranked.len().min(SHOWN_AFTER_RUN)]);
                    println!();
                }
                None => done_open = false,
            },
        }
    }
}

fn progress_line(ev: &BatchProgress) -> String {
    let status = match &ev.measurement {
        Some(m) => m.status_code.to_string(),
        None => "failed".to_string(),
    };
    format!(
        "  epoch {}/{}  ref {}/{} {}  {}/{} ({:.0}%)  {} {}",
        ev.position.epoch,
        ev.position.epochs,
        ev.position.content_index + 1,
        ev.position.content_count,
        ev.content_ref,
        ev.completed,
        ev.total,
        ev.fraction() * 100.0,
        ev.url,
        status
    )
}

fn batch_heading(done: &BatchFinished) -> String {
    let successes = done
        .ranked
        .iter()
        .filter(|e| e.status_code == Some(206))
        .count();
    format!(
        "Results for {} (epoch {}/{}): {}/{} gateways answered 206",
        done.content_ref,
        done.position.epoch,
        done.position.epochs,
        successes,
        done.ranked.len()
    )
}
