//! Fetch error types.

use skycast_core::WeatherErrorKind;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for provider and HTTP operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// The API key was rejected or missing.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider does not recognize the location query.
    #[error("Query not found: {0}")]
    QueryNotFound(String),

    /// The provider answered without weather data.
    #[error("No weather data: {0}")]
    NoData(String),

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] skycast_core::CoreError),
}

impl FetchError {
    /// Maps this error onto the user-facing error kind.
    pub fn kind(&self) -> WeatherErrorKind {
        match self {
            Self::Http(_) | Self::Timeout(_) | Self::RateLimited { .. } => {
                WeatherErrorKind::NetworkError
            }
            Self::AuthenticationFailed(_) => WeatherErrorKind::InvalidKey,
            Self::QueryNotFound(_) => WeatherErrorKind::QueryNotFound,
            Self::NoData(_) | Self::InvalidResponse(_) | Self::Json(_) | Self::Core(_) => {
                WeatherErrorKind::NoWeather
            }
            Self::InvalidUrl(_) => WeatherErrorKind::Unknown,
        }
    }

    /// Returns true for transport-level failures.
    pub fn is_network(&self) -> bool {
        self.kind() == WeatherErrorKind::NetworkError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(FetchError::Timeout(10).kind(), WeatherErrorKind::NetworkError);
        assert_eq!(
            FetchError::AuthenticationFailed("keynotfound".into()).kind(),
            WeatherErrorKind::InvalidKey
        );
        assert_eq!(
            FetchError::QueryNotFound("Atlantis".into()).kind(),
            WeatherErrorKind::QueryNotFound
        );
        assert_eq!(FetchError::NoData("empty".into()).kind(), WeatherErrorKind::NoWeather);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(FetchError::from(json_err).kind(), WeatherErrorKind::NoWeather);
    }

    #[test]
    fn test_rate_limit_is_network() {
        assert!(FetchError::RateLimited { retry_after: Some(5) }.is_network());
        assert!(!FetchError::NoData(String::new()).is_network());
    }
}
