//! In-process ranged GET through libcurl.

use std::time::Duration;

use super::error::ProbeError;
use super::measurement::RawSample;

/// Performs one ranged GET and reports status, time to first byte and bytes received.
///
/// The body is discarded. Runs in the current thread; call from `spawn_blocking`
/// if used from async code.
pub(super) fn fetch(url: &str, range_end: u64, timeout: Duration) -> Result<RawSample, ProbeError> {
    let mut received: u64 = 0;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout)?;
    easy.range(&format!("0-{range_end}"))?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            received += data.len() as u64;
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status_code = easy.response_code()?;
    let ttfb = easy.starttransfer_time()?;
    let total = easy.total_time()?.as_secs_f64();
    let speed = if total > 0.0 {
        received as f64 / total
    } else {
        0.0
    };

    Ok(RawSample {
        status_code,
        ttfb_secs: ttfb.as_secs_f64(),
        speed_bytes_per_sec: speed,
        bytes_downloaded: received,
    })
}
