//! Store error types.

use skycast_core::{ClassifiedError, WeatherErrorKind};
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A location with this query is already saved.
    #[error("Location already saved: {0}")]
    DuplicateLocation(String),

    /// No saved location has this query.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Reorder indexes outside the manual list.
    #[error("Invalid move {from} -> {to} in a list of {len}")]
    InvalidIndex {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
        /// Number of manual entries.
        len: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }

    /// Maps the error onto a user-facing weather error.
    pub fn classify(&self) -> ClassifiedError {
        let kind = match self {
            StoreError::DuplicateLocation(_) => WeatherErrorKind::DuplicateLocation,
            _ => WeatherErrorKind::Unknown,
        };
        let error = ClassifiedError::new(kind, self.to_string());
        match self {
            StoreError::DuplicateLocation(q) | StoreError::LocationNotFound(q) => {
                error.for_query(q.clone())
            }
            _ => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_classifies() {
        let err = StoreError::DuplicateLocation("Seattle, WA".to_string()).classify();
        assert_eq!(err.kind, WeatherErrorKind::DuplicateLocation);
        assert_eq!(err.query.as_deref(), Some("Seattle, WA"));
        assert!(!err.retryable);
    }

    #[test]
    fn test_transient() {
        let io = StoreError::Io(std::io::Error::other("disk"));
        assert!(io.is_transient());
        assert!(!StoreError::Config("bad".into()).is_transient());
    }
}
