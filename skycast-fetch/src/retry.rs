//! Retry policy for provider requests.

use reqwest::StatusCode;
use std::time::Duration;

/// Policy for retrying failed provider requests.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Whether to double the delay after each attempt.
    pub exponential_backoff: bool,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a strategy with `max_attempts` and a one second base delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            exponential_backoff: true,
            max_delay: Duration::from_secs(30),
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            exponential_backoff: false,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay after the given (1-based) attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        } else {
            self.base_delay
        };
        delay.min(self.max_delay)
    }

    /// Transport errors worth retrying: connect failures and timeouts.
    pub fn should_retry(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Status codes worth retrying: server errors and 429.
    pub fn should_retry_status(&self, status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::default();

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = RetryStrategy::new(10).with_base_delay(Duration::from_secs(10));
        assert_eq!(strategy.delay_for_attempt(5), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_status() {
        let strategy = RetryStrategy::default();
        assert!(strategy.should_retry_status(StatusCode::BAD_GATEWAY));
        assert!(strategy.should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!strategy.should_retry_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryStrategy::new(0).max_attempts, 1);
    }
}
