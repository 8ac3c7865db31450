//! Device position collaborator.
//!
//! The platform location service sits behind [`Locator`]. The CLI uses
//! [`FixedLocator`] for a `--position` flag and [`UnavailableLocator`]
//! otherwise.

use async_trait::async_trait;
use skycast_core::GeoPosition;
use std::time::Duration;
use thiserror::Error;

/// Oldest cached device position accepted.
pub const MAX_POSITION_AGE: Duration = Duration::from_secs(15 * 60);

/// How long to wait for a position fix.
pub const POSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Answer to a location access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// Access granted.
    Allowed,
    /// The user refused access.
    Denied,
    /// No decision, or the platform could not ask.
    Unspecified,
}

/// Position lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// Location access has not been granted.
    #[error("Location access denied")]
    AccessDenied,

    /// No fix within the timeout.
    #[error("Timed out waiting for a position")]
    Timeout,

    /// The location service is unavailable.
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Source of device positions.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Returns a position no older than `max_age`, waiting at most
    /// `timeout` for a fix.
    async fn position(
        &self,
        max_age: Duration,
        timeout: Duration,
    ) -> Result<GeoPosition, LocatorError>;

    /// Asks for location access.
    async fn request_access(&self) -> AccessStatus;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: GeoPosition,
}

impl FixedLocator {
    /// Creates a locator pinned to `position`.
    pub fn new(position: GeoPosition) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn position(
        &self,
        _max_age: Duration,
        _timeout: Duration,
    ) -> Result<GeoPosition, LocatorError> {
        Ok(self.position)
    }

    async fn request_access(&self) -> AccessStatus {
        AccessStatus::Allowed
    }
}

/// A device without a location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocator;

#[async_trait]
impl Locator for UnavailableLocator {
    async fn position(
        &self,
        _max_age: Duration,
        _timeout: Duration,
    ) -> Result<GeoPosition, LocatorError> {
        Err(LocatorError::Unavailable("no location service".to_string()))
    }

    async fn request_access(&self) -> AccessStatus {
        AccessStatus::Unspecified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_locator() {
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        let locator = FixedLocator::new(pos);
        assert_eq!(
            locator.position(MAX_POSITION_AGE, POSITION_TIMEOUT).await.unwrap(),
            pos
        );
        assert_eq!(locator.request_access().await, AccessStatus::Allowed);
    }

    #[tokio::test]
    async fn test_unavailable_locator() {
        let locator = UnavailableLocator;
        assert!(matches!(
            locator.position(MAX_POSITION_AGE, POSITION_TIMEOUT).await,
            Err(LocatorError::Unavailable(_))
        ));
        assert_eq!(locator.request_access().await, AccessStatus::Unspecified);
    }
}
