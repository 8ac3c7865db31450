//! Fetch context handed to every provider call.
//!
//! The context bundles the shared HTTP client with the request policy so
//! providers never construct their own clients.

use std::sync::Arc;
use std::time::Duration;

use crate::client::HttpClient;
use crate::error::FetchError;
use crate::retry::RetryStrategy;

// ============================================================================
// Request Policy
// ============================================================================

/// Timeout and retry budget for provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    /// Timeout for a single request.
    pub timeout: Duration,
    /// Total attempts on transient failures.
    pub attempts: u32,
    /// Delay before the first retry; later retries back off.
    pub first_retry_after: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 3,
            first_retry_after: Duration::from_secs(1),
        }
    }
}

impl RequestPolicy {
    fn retry_strategy(self) -> RetryStrategy {
        match self.attempts {
            0 | 1 => RetryStrategy::no_retry(),
            n => RetryStrategy::new(n).with_base_delay(self.first_retry_after),
        }
    }

    fn client(self) -> Result<HttpClient, FetchError> {
        Ok(HttpClient::with_timeout(self.timeout)?.with_retry_strategy(self.retry_strategy()))
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to weather providers. Clones share one client.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// HTTP client with retry.
    pub http: Arc<HttpClient>,
    /// Policy the client was built with.
    pub policy: RequestPolicy,
}

impl FetchContext {
    /// Creates a context with the default policy.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Starts from the default policy.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::default()
    }
}

/// Adjusts a [`RequestPolicy`] before building the client.
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    policy: RequestPolicy,
}

impl FetchContextBuilder {
    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Sets the number of attempts per request; 1 disables retries.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.attempts = attempts;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.policy.first_retry_after = delay;
        self
    }

    /// Builds the client and context.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        Ok(FetchContext {
            http: Arc::new(self.policy.client()?),
            policy: self.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_policy() {
        let ctx = FetchContext::builder()
            .timeout(Duration::from_secs(60))
            .max_attempts(1)
            .build()
            .unwrap();

        assert_eq!(ctx.http.timeout(), Duration::from_secs(60));
        assert_eq!(ctx.policy.attempts, 1);
    }

    #[test]
    fn test_default_policy() {
        let ctx = FetchContext::new().unwrap();
        assert_eq!(ctx.policy, RequestPolicy::default());
        assert_eq!(ctx.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let policy = RequestPolicy {
            attempts: 0,
            ..RequestPolicy::default()
        };
        assert_eq!(policy.retry_strategy().max_attempts, 1);
    }
}
