//! Core error types for Skycast.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Core error type for Skycast operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response or storage.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// User-facing error kinds
// ============================================================================

/// The kinds of failure surfaced to the user.
///
/// Each kind is reported at most once per viewing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherErrorKind {
    /// The provider could not be reached.
    NetworkError,
    /// The provider answered but returned no usable weather.
    NoWeather,
    /// The provider does not know the location query.
    QueryNotFound,
    /// The API key was rejected.
    InvalidKey,
    /// Location access was denied.
    LocationPermissionDenied,
    /// The location is already saved.
    DuplicateLocation,
    /// The device position could not be resolved to a query.
    GeocodeEmpty,
    /// Anything else.
    Unknown,
}

impl WeatherErrorKind {
    /// Returns true if the UI should offer a retry action.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkError | Self::NoWeather)
    }

    /// Short user-facing description.
    pub fn description(self) -> &'static str {
        match self {
            Self::NetworkError => "Unable to connect to the weather service",
            Self::NoWeather => "Unable to load weather data",
            Self::QueryNotFound => "Location not found",
            Self::InvalidKey => "Invalid API key",
            Self::LocationPermissionDenied => "Location access denied",
            Self::DuplicateLocation => "Location already added",
            Self::GeocodeEmpty => "Unable to determine current location",
            Self::Unknown => "An unknown error occurred",
        }
    }
}

impl fmt::Display for WeatherErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A classified failure delivered to the UI listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// What went wrong.
    pub kind: WeatherErrorKind,
    /// Detail message from the failing component.
    pub message: String,
    /// Location query the failure belongs to, if any.
    pub query: Option<String>,
    /// Whether a retry affordance should be shown.
    pub retryable: bool,
}

impl ClassifiedError {
    /// Creates a classified error; `retryable` follows the kind.
    pub fn new(kind: WeatherErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            query: None,
            retryable: kind.is_retryable(),
        }
    }

    /// Attaches the location query.
    #[must_use]
    pub fn for_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(q) => write!(f, "{} ({q}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(WeatherErrorKind::NetworkError.is_retryable());
        assert!(WeatherErrorKind::NoWeather.is_retryable());
        assert!(!WeatherErrorKind::InvalidKey.is_retryable());
        assert!(!WeatherErrorKind::LocationPermissionDenied.is_retryable());
    }

    #[test]
    fn test_classified_error_display() {
        let err = ClassifiedError::new(WeatherErrorKind::QueryNotFound, "no match")
            .for_query("Atlantis");
        assert!(!err.retryable);
        assert_eq!(err.to_string(), "Location not found (Atlantis): no match");
    }
}
