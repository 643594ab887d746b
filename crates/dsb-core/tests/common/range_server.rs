//! Minimal HTTP/1.1 server answering HEAD and `Range` GETs for one body.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RangeServerOptions {
    /// If true, GET ignores `Range` and always returns 200 with the full body.
    pub ignore_ranges: bool,
    /// The first N GETs are answered with 503.
    pub fail_first_gets: u32,
    /// Sent verbatim as `Content-Disposition` on HEAD.
    pub content_disposition: Option<String>,
}

pub struct RangeServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base: String,
    gets: Arc<AtomicU32>,
}

impl RangeServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// GET requests received so far, failed ones included.
    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }
}

/// Serves `body` on every path until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let gets = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &body, &opts, &counter));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}", port),
        gets,
    }
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(buf).ok()
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &RangeServerOptions, gets: &AtomicU32) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let (method, range) = parse_request(&request);
    let total = body.len() as u64;
    let accept = if opts.ignore_ranges { "" } else { "Accept-Ranges: bytes\r\n" };

    if method.eq_ignore_ascii_case("HEAD") {
        let disposition = opts
            .content_disposition
            .as_ref()
            .map(|d| format!("Content-Disposition: {}\r\n", d))
            .unwrap_or_default();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}{}Connection: close\r\n\r\n",
            total, accept, disposition
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let n = gets.fetch_add(1, Ordering::SeqCst);
    if n < opts.fail_first_gets {
        let _ = stream.write_all(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let (status, content_range, slice) = match range {
        Some((start, end)) if !opts.ignore_ranges => {
            let end = end.min(total.saturating_sub(1));
            if start > end || start >= total {
                ("416 Range Not Satisfiable", format!("bytes */{}", total), &body[0..0])
            } else {
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end, total),
                    &body[start as usize..=end as usize],
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
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\n{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        accept
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Returns (method, optional inclusive range from `Range: bytes=a-b`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let mut range = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let Some(bounds) = value.trim().strip_prefix("bytes=") else {
            continue;
        };
        if let Some((a, b)) = bounds.split_once('-') {
            let start = a.trim().parse::<u64>().unwrap_or(0);
            let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
            range = Some((start, end));
        }
    }
    (method, range)
}
