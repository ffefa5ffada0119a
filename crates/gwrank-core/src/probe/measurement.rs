//! Normalized probe result and the worst-case sentinel.

use serde::{Deserialize, Serialize};

/// Upper bound for reported response time; also the value used for failed probes.
pub const RESPONSE_TIME_CAP_MS: f64 = 1500.0;

/// Raw numbers reported by one fetch, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub status_code: u32,
    /// Time to first byte in seconds.
    pub ttfb_secs: f64,
    /// Transfer-average speed as reported by curl (informational only).
    pub speed_bytes_per_sec: f64,
    pub bytes_downloaded: u64,
}

/// Result of one probe. Always produced, even when the fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub response_time_ms: f64,
    pub status_code: u32,
    pub throughput_bytes_per_sec: f64,
    pub bytes_received: u64,
}

impl Measurement {
    /// Canonical result for transport failures, timeouts and malformed output.
    pub const WORST_CASE: Measurement = Measurement {
        response_time_ms: RESPONSE_TIME_CAP_MS,
        status_code: 0,
        throughput_bytes_per_sec: 0.0,
        bytes_received: 0,
    };

    /// Normalizes a raw sample.
    ///
    /// Throughput is bytes over time-to-first-byte. A sample with no bytes keeps
    /// its status but is forced to the response-time cap and zero throughput.
    /// Non-finite or negative timings are treated as malformed.
    pub fn from_sample(sample: RawSample) -> Self {
        if !sample.ttfb_secs.is_finite() || sample.ttfb_secs < 0.0 {
            return Self::WORST_CASE;
        }
        if sample.bytes_downloaded == 0 {
            return Measurement {
                response_time_ms: RESPONSE_TIME_CAP_MS,
                status_code: sample.status_code,
                throughput_bytes_per_sec: 0.0,
                bytes_received: 0,
            };
        }
        let throughput = if sample.ttfb_secs > 0.0 {
            sample.bytes_downloaded as f64 / sample.ttfb_secs
        } else {
            0.0
        };
        Measurement {
            response_time_ms: (sample.ttfb_secs * 1000.0).min(RESPONSE_TIME_CAP_MS),
            status_code: sample.status_code,
            throughput_bytes_per_sec: throughput,
            bytes_received: sample.bytes_downloaded,
        }
    }

    /// True for a ranged fetch that came back `206 Partial Content`.
    pub fn is_success(&self) -> bool {
        self.status_code == 206
    }

    pub fn is_worst_case(&self) -> bool {
        *self == Self::WORST_CASE
    }
}
