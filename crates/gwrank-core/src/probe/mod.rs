//! Gateway probe client.
//!
//! One bounded, range-limited GET against `<endpoint>/<content_path>/<content_ref>`,
//! normalized into a [`Measurement`]. Every failure (transport error, timeout,
//! malformed curl output) becomes [`Measurement::WORST_CASE`], so callers never
//! see an error. No retries: one attempt, one result.

mod command;
mod easy;
mod error;
mod measurement;
mod trailer;

use std::time::Duration;

use crate::config::{GwrankConfig, ProbeBackend};

pub use error::ProbeError;
pub use measurement::{Measurement, RawSample, RESPONSE_TIME_CAP_MS};
pub use trailer::{parse_trailer, TRAILER_FORMAT};

/// Something that can measure one endpoint for one content reference.
///
/// Implementations block for at most their configured timeout and must not panic;
/// the orchestrator runs them on the blocking pool.
pub trait Probe: Send + Sync {
    fn probe(&self, endpoint: &str, content_ref: &str) -> Measurement;
}

/// Per-probe request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub timeout: Duration,
    /// Last byte (inclusive) of the requested range.
    pub range_end: u64,
    pub content_path: String,
    /// Used when the caller passes an empty content reference.
    pub default_content_ref: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self::from_config(&GwrankConfig::default())
    }
}

impl ProbeOptions {
    pub fn from_config(cfg: &GwrankConfig) -> Self {
        Self {
            timeout: cfg.probe_timeout(),
            range_end: cfg.probe_range_end,
            content_path: cfg.content_path.clone(),
            default_content_ref: cfg.default_content_ref.clone(),
        }
    }
}

/// Builds the probe target `<endpoint>/<content_path>/<content_ref>`.
pub fn probe_url(endpoint: &str, content_path: &str, content_ref: &str) -> Result<String, ProbeError> {
    let base = endpoint.trim_end_matches('/');
    let path = content_path.trim_matches('/');
    let full = if path.is_empty() {
        format!("{base}/{content_ref}")
    } else {
        format!("{base}/{path}/{content_ref}")
    };
    url::Url::parse(&full).map_err(|source| ProbeError::InvalidUrl {
        url: full.clone(),
        source,
    })?;
    Ok(full)
}

/// Probe backed by curl: libcurl in-process or the `curl` executable.
#[derive(Debug, Clone)]
pub struct CurlProbe {
    options: ProbeOptions,
    backend: ProbeBackend,
    program: String,
}

impl CurlProbe {
    pub fn new(options: ProbeOptions, backend: ProbeBackend) -> Self {
        Self {
            options,
            backend,
            program: "curl".to_string(),
        }
    }

    pub fn from_config(cfg: &GwrankConfig) -> Self {
        Self::new(ProbeOptions::from_config(cfg), cfg.probe_backend).with_program(&cfg.curl_program)
    }

    /// Executable used by the command backend.
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Runs the fetch and reports the raw sample or the reason it failed.
    pub fn try_probe(&self, endpoint: &str, content_ref: &str) -> Result<RawSample, ProbeError> {
        let content_ref = if content_ref.is_empty() {
            self.options.default_content_ref.as_str()
        } else {
            content_ref
        };
        let url = probe_url(endpoint, &self.options.content_path, content_ref)?;
        tracing::debug!(%url, backend = ?self.backend, "probe start");
        match self.backend {
            ProbeBackend::Easy => easy::fetch(&url, self.options.range_end, self.options.timeout),
            ProbeBackend::Command => command::fetch(
                &self.program,
                &url,
                self.options.range_end,
                self.options.timeout,
            ),
        }
    }
}

impl Probe for CurlProbe {
    fn probe(&self, endpoint: &str, content_ref: &str) -> Measurement {
        match self.try_probe(endpoint, content_ref) {
            Ok(sample) => {
                let m = Measurement::from_sample(sample);
                tracing::debug!(
                    endpoint,
                    status = m.status_code,
                    response_time_ms = m.response_time_ms,
                    throughput_bytes_per_sec = m.throughput_bytes_per_sec,
                    bytes = m.bytes_received,
                    "probe finished"
                );
                m
            }
            Err(e) => {
                if e.is_timeout() {
                    tracing::debug!(endpoint, "probe timed out");
                } else {
                    tracing::debug!(endpoint, error = %e, "probe failed");
                }
                Measurement::WORST_CASE
            }
        }
    }
}
