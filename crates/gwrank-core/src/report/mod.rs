//! Plain-text reports: one table per batch, one summary per campaign epoch.
//!
//! Rendering is pure (ranked entries and a timestamp in, text out); the
//! [`ReportWriter`] puts the text on disk.

mod batch;
mod summary;
mod writer;

pub use batch::{render_batch_report, BatchStats};
pub use summary::{render_summary, CampaignSummary, ThroughputHistogram};
pub use writer::ReportWriter;

/// Timestamp layout inside report bodies.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp layout inside report file names.
pub const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Success rate as a percentage, or `N/A` when nothing valid was recorded.
fn format_rate(rate: f64, valid: u64) -> String {
    if valid == 0 {
        "N/A".to_string()
    } else {
        format!("{:.2}%", rate * 100.0)
    }
}

fn format_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}
