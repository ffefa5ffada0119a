//! `gwrank best` – content URLs on the best-ranked gateways.

use anyhow::Result;
use gwrank_core::config::GwrankConfig;
use gwrank_core::probe::probe_url;
use gwrank_core::rank::rank;

use super::load_saved_table;

pub fn run_best(cfg: &GwrankConfig, cid: Option<&str>, count: usize) -> Result<()> {
    let (paths, table) = load_saved_table(cfg)?;
    let Some(table) = table else {
        anyhow::bail!(
            "no endpoint state at {}; run `gwrank run` first",
            paths.state_file.display()
        );
    };
    let cid = cid.unwrap_or(&cfg.default_content_ref);
    for entry in rank(table.records()).iter().take(count) {
        println!("{}", probe_url(&entry.url, &cfg.content_path, cid)?);
    }
    Ok(())
}
