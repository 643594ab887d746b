//! Retry and backoff policy for range fetches.
//!
//! Classifies fetch failures (timeouts, throttling, connection failures, HTTP
//! status) and decides the bounded exponential backoff so every worker
//! retries the same way. The attempt ceiling turns a permanently failing
//! range into a fatal error instead of a spin loop.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Exhausted};
