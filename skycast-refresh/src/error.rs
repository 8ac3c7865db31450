//! Refresh error types.

use skycast_core::{ClassifiedError, WeatherErrorKind, WeatherSource};
use skycast_fetch::FetchError;
use skycast_store::StoreError;
use thiserror::Error;

use crate::gps::LocatorError;

/// Errors from orchestration and settings-page operations.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Provider failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Device position failure.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// No provider is registered for the source.
    #[error("No provider registered for {0}")]
    ProviderUnavailable(WeatherSource),

    /// The selected provider needs a key and none is set.
    #[error("{0} requires an API key")]
    MissingApiKey(WeatherSource),

    /// The provider rejected the key.
    #[error("API key was rejected")]
    InvalidKey,

    /// Location access was refused.
    #[error("Location access denied")]
    PermissionDenied,

    /// The location is already saved.
    #[error("Location already saved: {0}")]
    DuplicateLocation(String),

    /// A suggestion without a usable query was chosen.
    #[error("Suggestion has no location query")]
    EmptyQuery,
}

impl RefreshError {
    /// The user-facing kind of this error.
    pub fn kind(&self) -> WeatherErrorKind {
        match self {
            RefreshError::Store(StoreError::DuplicateLocation(_))
            | RefreshError::DuplicateLocation(_) => WeatherErrorKind::DuplicateLocation,
            RefreshError::Store(_) | RefreshError::ProviderUnavailable(_) => {
                WeatherErrorKind::Unknown
            }
            RefreshError::Fetch(e) => e.kind(),
            RefreshError::Locator(LocatorError::AccessDenied) | RefreshError::PermissionDenied => {
                WeatherErrorKind::LocationPermissionDenied
            }
            RefreshError::Locator(_) => WeatherErrorKind::Unknown,
            RefreshError::MissingApiKey(_) | RefreshError::InvalidKey => {
                WeatherErrorKind::InvalidKey
            }
            RefreshError::EmptyQuery => WeatherErrorKind::QueryNotFound,
        }
    }

    /// Converts into the form delivered to the UI listener.
    pub fn classify(&self) -> ClassifiedError {
        ClassifiedError::new(self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            RefreshError::Store(StoreError::DuplicateLocation("A".into())).kind(),
            WeatherErrorKind::DuplicateLocation
        );
        assert_eq!(
            RefreshError::Fetch(FetchError::Timeout(10)).kind(),
            WeatherErrorKind::NetworkError
        );
        assert_eq!(
            RefreshError::MissingApiKey(WeatherSource::WUnderground).kind(),
            WeatherErrorKind::InvalidKey
        );
        assert_eq!(
            RefreshError::PermissionDenied.kind(),
            WeatherErrorKind::LocationPermissionDenied
        );
    }

    #[test]
    fn test_classify_retryable_follows_kind() {
        assert!(RefreshError::Fetch(FetchError::NoData("x".into())).classify().retryable);
        assert!(!RefreshError::InvalidKey.classify().retryable);
    }
}
