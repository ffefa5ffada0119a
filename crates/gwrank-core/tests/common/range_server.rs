//! Minimal HTTP/1.1 gateway stand-in for integration tests.
//!
//! Serves one static body under every path. GET with `Range: bytes=X-Y` gets
//! 206 Partial Content; without a Range header (or with ranges disabled) the
//! full body comes back with 200. Optionally delays the response, stalls
//! part way through the body, or redirects paths under a prefix to the same
//! path without it.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RangeServerOptions {
    /// If true, Range is ignored and every GET is answered 200 with the full body.
    pub ignore_ranges: bool,
    /// Sleep before writing the response headers.
    pub delay: Option<Duration>,
    /// Requests whose path starts with this prefix get a 302 to the path without it.
    pub redirect_prefix: Option<String>,
    /// Write the headers and only this many body bytes, then hold the
    /// connection open for the given duration.
    pub stall_after: Option<(usize, Duration)>,
}

/// A running server. The listener thread lives until the process exits.
#[derive(Debug, Clone)]
pub struct RangeServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/".
    pub base_url: String,
    requests: Arc<AtomicUsize>,
}

impl RangeServer {
    /// Number of requests answered so far (redirects included).
    #[allow(dead_code)]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Gateway base URL below the server root, e.g. "http://127.0.0.1:12345/gw3".
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = opts.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                handle(stream, &body, &opts)
            });
        }
    });
    RangeServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

/// A base URL on which nothing listens.
#[allow(dead_code)]
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: &RangeServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, range) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    if let Some(prefix) = &opts.redirect_prefix {
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            let response = format!(
                "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                rest
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
    }
    if let Some(delay) = opts.delay {
        thread::sleep(delay);
    }

    let total = body.len() as u64;
    let (status, content_range, slice) = match range {
        Some((start, end_incl)) if !opts.ignore_ranges => {
            if total == 0 {
                ("206 Partial Content", "bytes */0".to_string(), &body[0..0])
            } else if start >= total {
                ("416 Range Not Satisfiable", format!("bytes */{}", total), &body[0..0])
            } else {
                let end_excl = end_incl.saturating_add(1).min(total);
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_excl - 1, total),
                    &body[start as usize..end_excl as usize],
                )
            }
        }
        _ => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            body,
        ),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
        status,
        slice.len(),
        content_range
    );
    let _ = stream.write_all(response.as_bytes());
    if let Some((sent, hold)) = opts.stall_after {
        let _ = stream.write_all(&slice[..sent.min(slice.len())]);
        let _ = stream.flush();
        thread::sleep(hold);
        return;
    }
    let _ = stream.write_all(slice);
}

/// Returns (method, path, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, &str, Option<(u64, u64)>) {
    let mut method = "";
    let mut path = "/";
    let mut range = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("/");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.trim().split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, path, range)
}
