//! Probe failure kinds. Never surfaced to the scoring path; each one collapses
//! into [`Measurement::WORST_CASE`](super::Measurement::WORST_CASE).

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid probe URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// libcurl reported an error (connection, DNS, timeout, ...).
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// curl exited non-zero; the transfer did not complete.
    #[error("curl exited with {0:?}")]
    Exit(Option<i32>),
    #[error("probe exceeded {0:?}")]
    Timeout(Duration),
    #[error("malformed trailer: {0:?}")]
    MalformedTrailer(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ProbeError::Timeout(_) => true,
            ProbeError::Curl(e) => e.is_operation_timedout(),
            _ => false,
        }
    }
}
