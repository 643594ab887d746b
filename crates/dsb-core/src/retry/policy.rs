use std::time::Duration;

/// High-level classification of a fetch failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read/stall).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, short body, ...).
    Connection,
    /// Retryable 5xx other than 503.
    Http5xx(u16),
    /// Any other non-success status. Retried like the rest: the range is
    /// known to exist, so a 4xx here is usually a flaky mirror.
    HttpStatus(u16),
    /// Never retried.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff with a delay cap and an attempt ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Failures of one chunk logged at `warn` before dropping to `debug`.
const LOUD_ATTEMPTS: u32 = 3;
/// After that, every Nth failure is still logged at `warn`.
const LOUD_EVERY: u32 = 10;

impl RetryPolicy {
    /// Policy that retries immediately. Used by tests and local fetchers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Connection
            | ErrorKind::Throttled
            | ErrorKind::Http5xx(_)
            | ErrorKind::HttpStatus(_) => {
                // base * 2^(attempt-1), exponent clamped, then capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(16);
                let raw = self.base_delay.saturating_mul(exp);
                RetryDecision::RetryAfter(raw.min(self.max_delay))
            }
        }
    }

    /// Whether the failure of `attempt` should be logged loudly.
    pub fn is_loud(&self, attempt: u32) -> bool {
        attempt <= LOUD_ATTEMPTS || attempt % LOUD_EVERY == 0
    }
}
