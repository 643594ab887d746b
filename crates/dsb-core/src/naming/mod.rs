//! Resource name derivation.
//!
//! The name doubles as the working directory and the final file name, so it
//! must be a single safe path component.

mod disposition;
mod sanitize;

pub use disposition::disposition_filename;
pub use sanitize::sanitize_component;

/// Name used when neither the response headers nor the URL yield one.
pub const FALLBACK_NAME: &str = "download.bin";

/// Last non-empty path segment of `url`, without query or fragment.
pub fn url_path_name(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = disposition::percent_decode(last);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Picks the resource name: `Content-Disposition` filename first, then the
/// URL path, then [`FALLBACK_NAME`].
pub fn resource_name(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(disposition_filename)
        .map(|n| sanitize_component(&n))
        .filter(|n| !n.is_empty())
        .or_else(|| url_path_name(url).map(|n| sanitize_component(&n)).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}
