//! Parse the `-w` trailer written by the curl executable.

use super::error::ProbeError;
use super::measurement::RawSample;

/// `-w` format producing the four trailer fields, in order.
pub const TRAILER_FORMAT: &str =
    "%{http_code} %{time_starttransfer} %{speed_download} %{size_download}\n";

/// Parses `<status> <ttfb_secs> <speed_bytes_per_sec> <bytes>`.
///
/// Exactly four whitespace-separated fields are accepted; anything else is malformed.
pub fn parse_trailer(output: &str) -> Result<RawSample, ProbeError> {
    let malformed = || ProbeError::MalformedTrailer(output.trim().to_string());
    let parts: Vec<&str> = output.split_whitespace().collect();
    let [status, ttfb, speed, size] = parts.as_slice() else {
        return Err(malformed());
    };
    Ok(RawSample {
        status_code: status.parse().map_err(|_| malformed())?,
        ttfb_secs: ttfb.parse().map_err(|_| malformed())?,
        speed_bytes_per_sec: speed.parse().map_err(|_| malformed())?,
        bytes_downloaded: size.parse().map_err(|_| malformed())?,
    })
}
