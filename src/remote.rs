//! Timeout and retry around remote collaborator calls.
//!
//! Only calls that leave the process go through [`call_remote`]. Local
//! detectors and renderers are never retried.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Bounded retry policy for one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub attempts: u32,

    /// Wait before the second attempt; doubles for each later attempt
    pub backoff: Duration,

    /// Time budget for a single attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create the default policy (2 attempts, 500 ms backoff, 30 s timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// A single attempt with no retry.
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Set the number of attempts.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the initial backoff.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt is 1-based; no wait before the first one
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(2))
    }
}

/// Run `op` under `policy`.
///
/// Each attempt is bounded by `policy.timeout`. Recoverable failures
/// (unavailable, timeout, malformed response) are retried; any other error
/// is returned at once. The last failure is returned when attempts run out.
pub async fn call_remote<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_err = Error::DetectorUnavailable(operation.to_string());

    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_before(attempt)).await;
        }

        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation: operation.to_string(),
                millis: policy.timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_recoverable() => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}",
                    operation,
                    attempt,
                    attempts,
                    e
                );
                last_err = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err)
}
