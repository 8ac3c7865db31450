//! Weather Underground error types.

use skycast_fetch::FetchError;
use thiserror::Error;

/// Errors reported inside a Weather Underground response body.
#[derive(Debug, Error)]
pub enum WuError {
    /// `error.type == "keynotfound"`.
    #[error("API key not found: {0}")]
    KeyNotFound(String),

    /// `error.type == "querynotfound"`.
    #[error("Query not found: {0}")]
    QueryNotFound(String),

    /// Any other error type.
    #[error("Weather Underground error {kind}: {description}")]
    Api {
        /// The `error.type` value.
        kind: String,
        /// The `error.description` value.
        description: String,
    },

    /// No API key configured.
    #[error("No Weather Underground API key configured")]
    MissingKey,
}

impl WuError {
    /// Builds an error from the `type` and `description` fields.
    pub fn from_type(kind: &str, description: Option<&str>) -> Self {
        let description = description.unwrap_or_default().to_string();
        match kind {
            "keynotfound" => Self::KeyNotFound(description),
            "querynotfound" => Self::QueryNotFound(description),
            other => Self::Api {
                kind: other.to_string(),
                description,
            },
        }
    }
}

impl From<WuError> for FetchError {
    fn from(e: WuError) -> Self {
        match e {
            WuError::KeyNotFound(_) | WuError::MissingKey => {
                FetchError::AuthenticationFailed(e.to_string())
            }
            WuError::QueryNotFound(_) => FetchError::QueryNotFound(e.to_string()),
            WuError::Api { .. } => FetchError::InvalidResponse(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_core::WeatherErrorKind;

    #[test]
    fn test_error_types_map_to_kinds() {
        let key: FetchError = WuError::from_type("keynotfound", Some("bad key")).into();
        assert_eq!(key.kind(), WeatherErrorKind::InvalidKey);

        let query: FetchError = WuError::from_type("querynotfound", None).into();
        assert_eq!(query.kind(), WeatherErrorKind::QueryNotFound);

        let other: FetchError = WuError::from_type("invalidfeature", None).into();
        assert_eq!(other.kind(), WeatherErrorKind::NoWeather);
    }
}
