//! Ranking view over the endpoint table.
//!
//! A pure projection: everything here is recomputed from the records, so the
//! ranking of a freshly loaded state file matches the one seen before saving.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scoring::{positive_mean, EndpointRecord};

/// Number of most recent throughput samples used for the recent average and stability.
pub const RECENT_SAMPLES: usize = 5;

/// One row of the ranking, with derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub url: String,
    pub is_primary: bool,
    pub weight: f64,
    pub success_ema: f64,
    pub response_time_ms: Option<f64>,
    pub status_code: Option<u32>,
    pub throughput_kbs: Option<f64>,
    pub last_probed: Option<DateTime<Utc>>,
    pub success_rate: f64,
    pub success_count: u64,
    pub valid_test_count: u64,
    pub total_attempts: u64,
    /// KB/s, mean of positive samples in the full history.
    pub avg_throughput: f64,
    /// KB/s, mean of positive samples among the last five.
    pub recent_avg_throughput: f64,
    /// Population standard deviation of the positive recent samples.
    pub speed_stability: f64,
    pub max_throughput: f64,
}

impl RankedEntry {
    pub fn from_record(record: &EndpointRecord) -> Self {
        let history = &record.throughput_history;
        let recent: Vec<f64> = history
            .iter()
            .skip(history.len().saturating_sub(RECENT_SAMPLES))
            .copied()
            .filter(|v| *v > 0.0)
            .collect();
        let last = record.last_measurement.as_ref();
        Self {
            url: record.url.clone(),
            is_primary: record.is_primary,
            weight: record.weight,
            success_ema: record.success_ema,
            response_time_ms: last.map(|m| m.response_time_ms),
            status_code: last.map(|m| m.status_code),
            throughput_kbs: last.map(|m| m.throughput_kbs),
            last_probed: last.map(|m| m.timestamp),
            success_rate: record.success_rate(),
            success_count: record.success_count,
            valid_test_count: record.valid_test_count,
            total_attempts: record.total_attempts,
            avg_throughput: record.avg_throughput,
            recent_avg_throughput: positive_mean(recent.iter().copied()),
            speed_stability: population_std_dev(&recent),
            max_throughput: history.iter().copied().fold(0.0, f64::max),
        }
    }
}

/// All records ordered by descending weight; equal weights keep table order.
pub fn rank(records: &[EndpointRecord]) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = records.iter().map(RankedEntry::from_record).collect();
    entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    entries
}

/// 0 for fewer than two values.
fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}
