//! Ranged GET through an external `curl` executable.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::error::ProbeError;
use super::measurement::RawSample;
use super::trailer::{parse_trailer, TRAILER_FORMAT};

/// curl's exit code for "operation timed out".
const CURL_TIMED_OUT: i32 = 28;

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Blocking entry point for the probe pool: drives [`fetch_async`] on the
/// current runtime, or on a throwaway one when called outside tokio.
pub(super) fn fetch(
    program: &str,
    url: &str,
    range_end: u64,
    limit: Duration,
) -> Result<RawSample, ProbeError> {
    let fut = fetch_async(program, url, range_end, limit);
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(fut),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(fut),
    }
}

/// Spawns `program` for one ranged GET and parses its trailer.
///
/// The child is killed if it is still running when `limit` expires. A
/// non-zero exit means the trailer describes a partial or failed transfer.
pub(super) async fn fetch_async(
    program: &str,
    url: &str,
    range_end: u64,
    limit: Duration,
) -> Result<RawSample, ProbeError> {
    let max_time = limit.as_secs_f64().ceil().max(1.0) as u64;
    let child = Command::new(program)
        .arg("-L")
        .arg("-s")
        .args(["-w", TRAILER_FORMAT])
        .args(["-o", null_device()])
        .args(["--max-time", &max_time.to_string()])
        .args(["--range", &format!("0-{range_end}")])
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProbeError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(res) => res?,
        Err(_) => return Err(ProbeError::Timeout(limit)),
    };
    match output.status.code() {
        Some(0) => parse_trailer(&String::from_utf8_lossy(&output.stdout)),
        Some(CURL_TIMED_OUT) => Err(ProbeError::Timeout(limit)),
        code => Err(ProbeError::Exit(code)),
    }
}
