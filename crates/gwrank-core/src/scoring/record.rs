//! Per-endpoint record and its invariants.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::RESPONSE_TIME_CAP_MS;

/// Starting value of the success EMA and the weight for a never-probed endpoint.
pub const INITIAL_SCORE: f64 = 1.0;

/// Snapshot of the most recent probe, as scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMeasurement {
    pub response_time_ms: f64,
    pub status_code: u32,
    pub throughput_kbs: f64,
    pub timestamp: DateTime<Utc>,
}

/// Score state for one gateway, keyed by its base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub url: String,
    pub is_primary: bool,
    pub success_ema: f64,
    pub weight: f64,
    pub last_measurement: Option<LastMeasurement>,
    /// Most recent throughput samples in KB/s, oldest first.
    pub throughput_history: VecDeque<f64>,
    /// Mean of the strictly positive entries of `throughput_history`.
    pub avg_throughput: f64,
    /// Most recent weights, oldest first.
    pub weight_history: VecDeque<f64>,
    pub total_attempts: u64,
    /// Probes that returned anything other than HTTP 200.
    pub valid_test_count: u64,
    /// Valid probes that returned HTTP 206.
    pub success_count: u64,
}

impl EndpointRecord {
    pub fn new(url: impl Into<String>, is_primary: bool) -> Self {
        Self {
            url: url.into(),
            is_primary,
            success_ema: INITIAL_SCORE,
            weight: INITIAL_SCORE,
            last_measurement: None,
            throughput_history: VecDeque::new(),
            avg_throughput: 0.0,
            weight_history: VecDeque::new(),
            total_attempts: 0,
            valid_test_count: 0,
            success_count: 0,
        }
    }

    /// `success_count / valid_test_count`, or 0 when nothing valid was recorded.
    pub fn success_rate(&self) -> f64 {
        if self.valid_test_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.valid_test_count as f64
        }
    }

    /// Reconciles every field against the invariants, replacing anything unusable
    /// with the value a fresh record would carry. Identity is kept as is.
    pub fn sanitized(mut self, w_min: f64, history_len: usize) -> Self {
        if !self.success_ema.is_finite() || !(0.0..=1.0).contains(&self.success_ema) {
            self.success_ema = INITIAL_SCORE;
        }
        if !self.weight.is_finite() {
            self.weight = INITIAL_SCORE;
        }
        self.weight = self.weight.max(w_min);

        let usable = self.last_measurement.as_ref().map_or(true, |last| {
            last.response_time_ms.is_finite()
                && last.response_time_ms >= 0.0
                && last.throughput_kbs.is_finite()
                && last.throughput_kbs >= 0.0
        });
        if !usable {
            self.last_measurement = None;
        }
        if let Some(last) = self.last_measurement.as_mut() {
            last.response_time_ms = last.response_time_ms.min(RESPONSE_TIME_CAP_MS);
        }

        self.throughput_history.retain(|v| v.is_finite() && *v >= 0.0);
        truncate_front(&mut self.throughput_history, history_len);
        self.weight_history.retain(|v| v.is_finite());
        truncate_front(&mut self.weight_history, history_len);
        self.avg_throughput = positive_mean(self.throughput_history.iter().copied());

        self.valid_test_count = self.valid_test_count.min(self.total_attempts);
        self.success_count = self.success_count.min(self.valid_test_count);
        self
    }
}

/// Appends `value`, evicting from the front until at most `cap` entries remain.
pub fn push_bounded(history: &mut VecDeque<f64>, value: f64, cap: usize) {
    history.push_back(value);
    truncate_front(history, cap);
}

fn truncate_front(history: &mut VecDeque<f64>, cap: usize) {
    while history.len() > cap {
        history.pop_front();
    }
}

/// Mean of the strictly positive values, 0 if there are none.
pub fn positive_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
