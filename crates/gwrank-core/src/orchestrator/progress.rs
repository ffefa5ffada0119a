//! Events emitted while a campaign runs.
//!
//! Per-probe progress is sent with `try_send`, so a slow or absent consumer
//! never holds up probing. The ranking after each batch is sent with `send`.

use crate::probe::Measurement;
use crate::rank::RankedEntry;

/// Where a batch sits inside its campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPosition {
    /// 1-based epoch number.
    pub epoch: u32,
    pub epochs: u32,
    /// 0-based index into the campaign's content references.
    pub content_index: usize,
    pub content_count: usize,
}

/// One probe task finished.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub position: BatchPosition,
    pub content_ref: String,
    /// Probes finished so far in this batch, including this one.
    pub completed: usize,
    pub total: usize,
    pub url: String,
    /// `None` when the probe task failed and the endpoint was left unchanged.
    pub measurement: Option<Measurement>,
}

impl BatchProgress {
    /// Fraction of the batch done, in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_last(&self) -> bool {
        self.completed >= self.total
    }
}

/// One batch finished; the table ranked right after it was scored.
#[derive(Debug, Clone)]
pub struct BatchFinished {
    pub position: BatchPosition,
    pub content_ref: String,
    pub ranked: Vec<RankedEntry>,
}
