//! Classify HTTP status and fetch errors into retry policy error kinds.

use crate::fetcher::FetchError;
use crate::retry::policy::ErrorKind;

/// Classify a non-2xx HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::HttpStatus(code as u16),
    }
}

/// Classify a curl error for retry decisions.
///
/// Everything except a timeout counts as a connection failure: the range is
/// retried at the same offset either way.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::Connection
    }
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Connection(_) => ErrorKind::Connection,
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::PartialTransfer { .. } => ErrorKind::Connection,
        FetchError::RangeIgnored(_) => ErrorKind::Other,
    }
}
