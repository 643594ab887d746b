//! Parse HTTP response header lines collected during a HEAD request.

/// Headers of the last response in a redirect chain.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Head {
    pub content_length: Option<u64>,
    pub accept_ranges: bool,
    pub content_disposition: Option<String>,
}

/// Each status line (`HTTP/...`) starts a new response, so only the headers
/// after the last one count.
pub(crate) fn parse_headers(lines: &[String]) -> Head {
    let mut head = Head::default();
    for line in lines {
        let line = line.trim();
        if line.starts_with("HTTP/") {
            head = Head::default();
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            head.content_length = value.parse().ok();
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            head.accept_ranges = value.eq_ignore_ascii_case("bytes");
        } else if name.eq_ignore_ascii_case("content-disposition") {
            head.content_disposition = Some(value.to_string());
        }
    }
    head
}
