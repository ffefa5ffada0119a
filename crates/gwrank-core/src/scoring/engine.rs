//! Weight update rule.

use chrono::{DateTime, Utc};

use crate::probe::{Measurement, RESPONSE_TIME_CAP_MS};

use super::params::ScoringParams;
use super::record::{positive_mean, push_bounded, EndpointRecord, LastMeasurement};

/// Throughput samples above this (KB/s) are stored as this value.
pub const MAX_THROUGHPUT_KBS: f64 = 1.0e9;

/// Intermediate terms of one weight computation (logged at debug level).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBreakdown {
    pub ema: f64,
    pub gamma_time: f64,
    pub gamma_speed: f64,
    pub base_weight: f64,
    pub weight: f64,
}

/// Turns measurements into weights. Holds only immutable parameters, so one
/// engine can be shared by any number of batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    params: ScoringParams,
}

impl ScoringEngine {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Latency penalty: 1 at 0 ms, `base_ln` at the response-time cap.
    pub fn gamma_time(&self, response_time_ms: f64) -> f64 {
        (-self.params.k_time() * response_time_ms / RESPONSE_TIME_CAP_MS).exp()
    }

    /// Logistic throughput penalty: `k_speed` at 0 KB/s, approaching 1 as throughput grows.
    /// The exponent normalizes by 1024 KB/s.
    pub fn gamma_speed(&self, throughput_kbs: f64) -> f64 {
        1.0 / (1.0 + self.params.k_speed_logistic() * (-throughput_kbs / 1024.0).exp())
    }

    /// Combines an updated EMA with the two penalties, floored at `w_min`.
    pub fn weight(&self, ema: f64, response_time_ms: f64, throughput_kbs: f64) -> WeightBreakdown {
        let gamma_time = self.gamma_time(response_time_ms);
        let gamma_speed = self.gamma_speed(throughput_kbs);
        let base_weight = ema.powf(self.params.beta());
        let weight = (base_weight * gamma_time * gamma_speed).max(self.params.w_min());
        WeightBreakdown {
            ema,
            gamma_time,
            gamma_speed,
            base_weight,
            weight,
        }
    }

    /// Applies one measurement to a record, stamped with the current time.
    pub fn update(&self, record: &EndpointRecord, measurement: &Measurement) -> EndpointRecord {
        self.update_at(record, measurement, Utc::now())
    }

    /// Applies one measurement to a record and returns the new record.
    ///
    /// Never fails: the input is reconciled against the record invariants first,
    /// and non-finite measurement fields are clamped into range.
    pub fn update_at(
        &self,
        record: &EndpointRecord,
        measurement: &Measurement,
        at: DateTime<Utc>,
    ) -> EndpointRecord {
        let history_len = self.params.history_len();
        let mut next = record.clone().sanitized(self.params.w_min(), history_len);

        let response_time_ms = if measurement.response_time_ms.is_nan() {
            RESPONSE_TIME_CAP_MS
        } else {
            measurement.response_time_ms.clamp(0.0, RESPONSE_TIME_CAP_MS)
        };
        let throughput_kbs = if measurement.throughput_bytes_per_sec > 0.0 {
            (measurement.throughput_bytes_per_sec / 1024.0).min(MAX_THROUGHPUT_KBS)
        } else {
            0.0
        };
        let success = measurement.is_success();

        let alpha = self.params.alpha();
        let observed = if success { 1.0 } else { 0.0 };
        let ema = (alpha * observed + (1.0 - alpha) * next.success_ema).clamp(0.0, 1.0);
        let breakdown = self.weight(ema, response_time_ms, throughput_kbs);

        next.success_ema = ema;
        next.weight = breakdown.weight;
        next.last_measurement = Some(LastMeasurement {
            response_time_ms,
            status_code: measurement.status_code,
            throughput_kbs,
            timestamp: at,
        });

        push_bounded(&mut next.throughput_history, throughput_kbs, history_len);
        next.avg_throughput = positive_mean(next.throughput_history.iter().copied());
        push_bounded(&mut next.weight_history, breakdown.weight, history_len);

        next.total_attempts = next.total_attempts.saturating_add(1);
        // 200 means the gateway ignored the range; it says nothing about success.
        if measurement.status_code != 200 {
            next.valid_test_count = next.valid_test_count.saturating_add(1);
            if success {
                next.success_count = next.success_count.saturating_add(1);
            }
        }

        tracing::debug!(
            url = %next.url,
            status = measurement.status_code,
            response_time_ms,
            throughput_kbs,
            ema = breakdown.ema,
            gamma_time = breakdown.gamma_time,
            gamma_speed = breakdown.gamma_speed,
            base_weight = breakdown.base_weight,
            weight = breakdown.weight,
            "endpoint score updated"
        );

        next
    }
}

#[cfg(test)]
mod tests;
