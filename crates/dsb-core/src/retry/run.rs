//! Retry loop: run a fetch until success or the policy says stop.

use std::fmt;

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::fetcher::FetchError;

/// The last error once the policy gave up, with the number of attempts made.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub error: FetchError,
}

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
///
/// Returns the value together with the number of failed attempts before it.
/// `what` labels log lines (e.g. the range being fetched).
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    what: &dyn fmt::Display,
    mut f: F,
) -> Result<(T, u32), Exhausted>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok((v, attempt - 1)),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(Exhausted {
                            attempts: attempt,
                            error: e,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        if policy.is_loud(attempt) {
                            tracing::warn!(%what, attempt, ?kind, delay_ms = d.as_millis() as u64, "fetch failed: {}, retrying", e);
                        } else {
                            tracing::debug!(%what, attempt, ?kind, "fetch failed: {}, retrying", e);
                        }
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
