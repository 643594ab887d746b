//! Range Fetcher: one bounded HTTP range request per call.
//!
//! The engine only depends on the [`RangeFetcher`] trait; the resource being
//! fetched is bound into the implementation. [`CurlFetcher`] is the libcurl
//! implementation used by the CLI.

mod curl_fetcher;

pub use curl_fetcher::{CurlFetcher, CurlOptions};

use thiserror::Error;

use crate::range::ByteRange;

/// Classified failure of a single range request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection reset, DNS, ...).
    #[error("transport: {0}")]
    Curl(#[from] curl::Error),
    /// Transport failure reported by a non-curl fetcher.
    #[error("connection: {0}")]
    Connection(String),
    /// Response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body length differs from the requested range (server closed early or
    /// sent too much).
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Server answered a partial request with a full body.
    #[error("server ignored the range request (HTTP {0})")]
    RangeIgnored(u32),
}

/// Fetches an inclusive byte range of a fixed resource.
///
/// Called concurrently from every worker thread; implementations must not
/// hold shared locks across the request.
pub trait RangeFetcher: Send + Sync {
    fn fetch(&self, range: ByteRange) -> Result<Vec<u8>, FetchError>;
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for std::sync::Arc<F> {
    fn fetch(&self, range: ByteRange) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(range)
    }
}

/// Rejects bodies whose length does not match the requested range, so a
/// short read is retried instead of leaving a gap in the part file.
pub fn check_body(range: ByteRange, body: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    let received = body.len() as u64;
    if received != range.len() {
        return Err(FetchError::PartialTransfer {
            expected: range.len(),
            received,
        });
    }
    Ok(body)
}
