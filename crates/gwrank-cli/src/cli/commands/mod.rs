//! CLI command handlers, one file per command.

mod best;
mod completions;
mod probe;
mod rank;
mod run;

use anyhow::{Context, Result};
use gwrank_core::config::{GwrankConfig, GwrankPaths};
use gwrank_core::scoring::ScoringParams;
use gwrank_core::table::EndpointTable;

pub use best::run_best;
pub use completions::run_completions;
pub use probe::run_probe;
pub use rank::run_rank;
pub use run::run_campaign;

/// Saved endpoint state, or `None` if no campaign has run yet.
fn load_saved_table(cfg: &GwrankConfig) -> Result<(GwrankPaths, Option<EndpointTable>)> {
    let paths = cfg.paths()?;
    let params = ScoringParams::from_config(&cfg.scoring());
    let table = EndpointTable::load_from_path(&paths.state_file, &params)
        .with_context(|| format!("load endpoint state: {}", paths.state_file.display()))?;
    Ok((paths, table))
}
