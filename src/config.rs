//! Configuration for backend calls.
//!
//! Layout tuning lives next to the algorithms as module constants; this
//! struct only covers the I/O side: concurrency, timeouts, polling and retry.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::recognition::retry::RetryPolicy;

/// Environment variable for [`ReflowConfig::max_concurrency`].
pub const ENV_MAX_CONCURRENCY: &str = "REFLOW_MAX_CONCURRENCY";
/// Environment variable for [`ReflowConfig::request_timeout`], in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REFLOW_REQUEST_TIMEOUT_SECS";
/// Environment variable for [`ReflowConfig::operation_timeout`], in seconds.
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "REFLOW_OPERATION_TIMEOUT_SECS";
/// Environment variable for [`ReflowConfig::poll_interval`], in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "REFLOW_POLL_INTERVAL_MS";
/// Environment variable for [`ReflowConfig::max_attempts`].
pub const ENV_MAX_ATTEMPTS: &str = "REFLOW_MAX_ATTEMPTS";
/// Environment variable for [`ReflowConfig::backoff_factor`].
pub const ENV_BACKOFF_FACTOR: &str = "REFLOW_BACKOFF_FACTOR";

/// Backend I/O configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflowConfig {
    /// Upper bound on concurrent recognition calls.
    pub max_concurrency: usize,

    /// Budget for a single recognition attempt, polling included.
    pub request_timeout: Duration,

    /// Budget for an asynchronous operation to reach a final status.
    ///
    /// Must be shorter than [`request_timeout`](Self::request_timeout).
    pub operation_timeout: Duration,

    /// Delay between status checks of an asynchronous operation.
    pub poll_interval: Duration,

    /// Attempts per page before giving up on retryable errors.
    pub max_attempts: u32,

    /// Backoff base in seconds; 0 retries immediately.
    pub backoff_factor: f64,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflowConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            max_concurrency: 8,
            request_timeout: Duration::from_secs(360),
            operation_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
            max_attempts: 3,
            backoff_factor: 0.5,
        }
    }

    /// Defaults overlaid with any `REFLOW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Split out from [`ReflowConfig::from_env`] so tests do not have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(v) = parse_var::<usize>(ENV_MAX_CONCURRENCY, lookup(ENV_MAX_CONCURRENCY))? {
            config.max_concurrency = v;
        }
        if let Some(v) =
            parse_var::<u64>(ENV_REQUEST_TIMEOUT_SECS, lookup(ENV_REQUEST_TIMEOUT_SECS))?
        {
            config.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) =
            parse_var::<u64>(ENV_OPERATION_TIMEOUT_SECS, lookup(ENV_OPERATION_TIMEOUT_SECS))?
        {
            config.operation_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<u64>(ENV_POLL_INTERVAL_MS, lookup(ENV_POLL_INTERVAL_MS))? {
            config.poll_interval = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u32>(ENV_MAX_ATTEMPTS, lookup(ENV_MAX_ATTEMPTS))? {
            config.max_attempts = v;
        }
        if let Some(v) = parse_var::<f64>(ENV_BACKOFF_FACTOR, lookup(ENV_BACKOFF_FACTOR))? {
            config.backoff_factor = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the fetch loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::InvalidConfig("max_concurrency must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "backoff_factor must be a non-negative number, got {}",
                self.backoff_factor
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig("request_timeout must be positive".into()));
        }
        if self.operation_timeout.is_zero() {
            return Err(Error::InvalidConfig("operation_timeout must be positive".into()));
        }
        // The polling budget has to run out before the attempt timeout fires.
        if self.operation_timeout >= self.request_timeout {
            return Err(Error::InvalidConfig(
                "operation_timeout must be shorter than request_timeout".into(),
            ));
        }
        Ok(())
    }

    /// Set the concurrency bound.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the asynchronous operation budget.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the retry attempt count.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff base.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_factor)
    }
}

fn parse_var<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{key}: cannot parse {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ReflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_lookup_overrides() {
        let config = ReflowConfig::from_lookup(lookup_from(&[
            (ENV_MAX_CONCURRENCY, "2"),
            (ENV_POLL_INTERVAL_MS, "250"),
            (ENV_BACKOFF_FACTOR, "0"),
        ]))
        .unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.backoff_factor, 0.0);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let err = ReflowConfig::from_lookup(lookup_from(&[(ENV_MAX_ATTEMPTS, "many")]));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ReflowConfig::new().with_max_concurrency(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_backoff_rejected() {
        let config = ReflowConfig::new().with_backoff_factor(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_operation_budget_must_fit_request() {
        let config = ReflowConfig::new()
            .with_request_timeout(Duration::from_secs(10))
            .with_operation_timeout(Duration::from_secs(20));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_timeouts_rejected() {
        let config = ReflowConfig::new()
            .with_request_timeout(Duration::from_secs(30))
            .with_operation_timeout(Duration::from_secs(30));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let shorter = config.with_operation_timeout(Duration::from_secs(29));
        assert!(shorter.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_from_lookup_rejected() {
        let both = ReflowConfig::from_lookup(lookup_from(&[
            (ENV_REQUEST_TIMEOUT_SECS, "0"),
            (ENV_OPERATION_TIMEOUT_SECS, "0"),
        ]));
        assert!(matches!(both, Err(Error::InvalidConfig(_))));

        let operation_only =
            ReflowConfig::from_lookup(lookup_from(&[(ENV_OPERATION_TIMEOUT_SECS, "0")]));
        assert!(matches!(operation_only, Err(Error::InvalidConfig(_))));
    }
}
