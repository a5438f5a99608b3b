//! Exponential backoff for transient backend failures.

use std::future::Future;
use std::time::Duration;

use crate::error::BackendError;

/// How often, and how patiently, a failing call is repeated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,
    /// Backoff base in seconds; 0 retries immediately
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 0.5)
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_factor,
        }
    }

    /// Wait before retry number `retry` (0 for the first retry).
    ///
    /// # Examples
    ///
    /// ```
    /// use scan_reflow::recognition::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(4, 0.5);
    /// assert_eq!(policy.delay(0), Duration::from_millis(500));
    /// assert_eq!(policy.delay(2), Duration::from_secs(2));
    ///
    /// assert_eq!(RetryPolicy::new(4, 0.0).delay(3), Duration::ZERO);
    /// ```
    pub fn delay(&self, retry: u32) -> Duration {
        if self.backoff_factor <= 0.0 || !self.backoff_factor.is_finite() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
            .unwrap_or(Duration::MAX)
    }
}

/// Why [`retry`] gave up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetryError {
    /// A non-retryable error; no further attempts were made
    #[error("{0}")]
    Fatal(BackendError),

    /// Every attempt failed with a retryable error
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: BackendError,
    },
}

/// Run `operation` until it succeeds, fails terminally, or runs out of
/// attempts.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(RetryError::Fatal(err)),
            Err(err) if attempt >= policy.max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            },
            Err(err) => {
                let delay = policy.delay(attempt - 1);
                log::warn!(
                    "Attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    err,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            },
        }
    }
}
