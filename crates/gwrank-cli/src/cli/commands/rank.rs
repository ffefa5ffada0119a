//! `gwrank rank` – show the ranking from saved state.

use anyhow::Result;
use gwrank_core::config::GwrankConfig;
use gwrank_core::rank::{rank, RankedEntry};

use super::load_saved_table;

pub(super) fn print_ranking(entries: &[RankedEntry]) {
    println!(
        "{:>4}  {:<50} {:>7} {:>6} {:>8} {:>8} {:>10}",
        "#", "ENDPOINT", "WEIGHT", "EMA", "RT(ms)", "SUCCESS", "AVG KB/s"
    );
    for (i, e) in entries.iter().enumerate() {
        let rt = e
            .response_time_ms
            .map(|v| format!("{v:.0}"))
            .unwrap_or_else(|| "-".to_string());
        let success = if e.valid_test_count == 0 {
            "-".to_string()
        } else {
            format!("{:.0}%", e.success_rate * 100.0)
        };
        println!(
            "{:>4}  {:<50} {:>7.3} {:>6.3} {:>8} {:>8} {:>10.1}",
            i + 1,
            e.url,
            e.weight,
            e.success_ema,
            rt,
            success,
            e.avg_throughput
        );
    }
}

pub fn run_rank(cfg: &GwrankConfig, top: Option<usize>, json: bool) -> Result<()> {
    let (paths, table) = load_saved_table(cfg)?;
    let Some(table) = table else {
        println!(
            "No endpoint state at {}. Run `gwrank run` first.",
            paths.state_file.display()
        );
        return Ok(());
    };
    let mut ranked = rank(table.records());
    if let Some(n) = top {
        ranked.truncate(n);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        print_ranking(&ranked);
    }
    Ok(())
}
