//! HTTP client shared by all weather providers.

use crate::error::FetchError;
use crate::retry::RetryStrategy;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

/// HTTP client with retry capabilities.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    retry_strategy: RetryStrategy,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            retry_strategy: RetryStrategy::default(),
            timeout,
        })
    }

    /// Sets the retry strategy for this client.
    #[must_use]
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Returns the configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request, retrying transient failures.
    ///
    /// Non-success statuses that are not retried map onto [`FetchError`]:
    /// 401/403 become `AuthenticationFailed`, 429 becomes `RateLimited`,
    /// anything else `InvalidResponse`.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted.
    #[instrument(skip(self, url), fields(url = %redact(url)))]
    pub async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        let mut attempts = 0;
        let max_attempts = self.retry_strategy.max_attempts;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Making GET request");

            let result = self
                .inner
                .get(url.clone())
                .header(header::ACCEPT, "application/json")
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!(status = %status, "Response received");
                        return Ok(response);
                    }

                    if attempts < max_attempts && self.retry_strategy.should_retry_status(status) {
                        let delay = retry_after(&response)
                            .unwrap_or_else(|| self.retry_strategy.delay_for_attempt(attempts));
                        warn!(
                            status = %status,
                            delay_ms = delay.as_millis(),
                            "Provider returned retryable status, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(status_error(status, &response));
                }
                Err(e) => {
                    if attempts < max_attempts && self.retry_strategy.should_retry(&e) {
                        let delay = self.retry_strategy.delay_for_attempt(attempts);
                        warn!(
                            error = %e,
                            delay_ms = delay.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    if e.is_timeout() {
                        return Err(FetchError::Timeout(self.timeout.as_secs()));
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Performs a GET request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns transport errors from [`HttpClient::get`] or a JSON error if
    /// the body does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let response = self.get(url).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

fn status_error(status: StatusCode, response: &Response) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::AuthenticationFailed(format!("Provider rejected credentials ({status})"))
        }
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after: retry_after(response).map(|d| d.as_secs()),
        },
        _ => FetchError::InvalidResponse(format!("Unexpected status code: {status}")),
    }
}

/// Strips path segments that look like API keys from a URL for logging.
pub(crate) fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    let segments: Vec<String> = url
        .path_segments()
        .map(|s| {
            let mut prev_api = false;
            s.map(|seg| {
                let out = if prev_api { "***".to_string() } else { seg.to_string() };
                prev_api = seg == "api";
                out
            })
            .collect()
        })
        .unwrap_or_default();
    shown.set_path(&format!("/{}", segments.join("/")));
    shown.to_string()
}
