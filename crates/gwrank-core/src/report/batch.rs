//! Per-batch result table.

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::rank::RankedEntry;

use super::{format_opt, format_rate, REPORT_TIME_FORMAT};

/// Aggregates printed under a batch table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub total: usize,
    /// Endpoints with a success rate above zero.
    pub successful: usize,
    /// Mean last response time over endpoints that have a nonzero one.
    pub avg_response_time_ms: f64,
    /// Mean last throughput (KB/s) over endpoints that have a nonzero one.
    pub avg_throughput_kbs: f64,
}

impl BatchStats {
    pub fn from_ranked(ranked: &[RankedEntry]) -> Self {
        let times: Vec<f64> = ranked
            .iter()
            .filter_map(|e| e.response_time_ms)
            .filter(|v| *v > 0.0)
            .collect();
        let speeds: Vec<f64> = ranked
            .iter()
            .filter_map(|e| e.throughput_kbs)
            .filter(|v| *v > 0.0)
            .collect();
        Self {
            total: ranked.len(),
            successful: ranked.iter().filter(|e| e.success_rate > 0.0).count(),
            avg_response_time_ms: mean(&times),
            avg_throughput_kbs: mean(&speeds),
        }
    }

    pub(super) fn write_to(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Endpoints:            {}", self.total)?;
        writeln!(out, "Successful endpoints: {}", self.successful)?;
        writeln!(out, "Avg response time:    {:.2} ms", self.avg_response_time_ms)?;
        writeln!(out, "Avg throughput:       {:.2} KB/s", self.avg_throughput_kbs)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Renders every endpoint of one batch (already ranked) followed by [`BatchStats`].
pub fn render_batch_report(
    content_ref: &str,
    ranked: &[RankedEntry],
    generated_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_batch_report(&mut out, content_ref, ranked, generated_at);
    out
}

fn write_batch_report(
    out: &mut String,
    content_ref: &str,
    ranked: &[RankedEntry],
    generated_at: NaiveDateTime,
) -> std::fmt::Result {
    writeln!(out, "=== Batch {} ===", generated_at.format(REPORT_TIME_FORMAT))?;
    writeln!(out, "Content: {content_ref}")?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<50} {:<4} {:>7} {:>7} {:>9} {:>6} {:>9} {:>11} {:>12}",
        "ENDPOINT", "PRI", "WEIGHT", "EMA", "RT(ms)", "STATUS", "SUCCESS", "VALID/TOTAL", "KB/s"
    )?;
    writeln!(out, "{}", "-".repeat(123))?;
    for e in ranked {
        let status = e
            .status_code
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<50} {:<4} {:>7.3} {:>7.3} {:>9} {:>6} {:>9} {:>11} {:>12}",
            e.url,
            if e.is_primary { "yes" } else { "no" },
            e.weight,
            e.success_ema,
            format_opt(e.response_time_ms, 1),
            status,
            format_rate(e.success_rate, e.valid_test_count),
            format!("{}/{}", e.valid_test_count, e.total_attempts),
            format_opt(e.throughput_kbs, 1),
        )?;
    }
    writeln!(out)?;
    BatchStats::from_ranked(ranked).write_to(out)
}
