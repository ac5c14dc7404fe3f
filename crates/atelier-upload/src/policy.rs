//! Retry policy for single-file uploads.

use atelier_core::{UploadConfig, UploadError};
use std::time::Duration;

/// Bounded retry with linear backoff.
///
/// The sleep before attempt `n + 1` is `n * base_delay`, so with the default
/// base of one second three attempts wait 1s then 2s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_attempts, config.retry_base_delay)
    }

    /// Same backoff, different attempt budget.
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether attempt `attempt` failing with `err` leads to another attempt.
    pub fn should_retry(&self, err: &UploadError, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_linear_in_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff(5), Duration::from_millis(5000));
    }

    #[test]
    fn retries_only_network_failures_below_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let blocked = UploadError::NetworkBlocked("failed to fetch".into());
        let rejected = UploadError::RemoteRejected("quota exceeded".into());

        assert!(policy.should_retry(&blocked, 1));
        assert!(policy.should_retry(&blocked, 2));
        assert!(!policy.should_retry(&blocked, 3));
        assert!(!policy.should_retry(&rejected, 1));
    }

    #[test]
    fn single_attempt_never_retries() {
        let policy = RetryPolicy::default().with_max_attempts(1);
        let blocked = UploadError::NetworkBlocked("cors".into());
        assert!(!policy.should_retry(&blocked, 1));
    }
}
