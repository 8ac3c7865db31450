//! Per-session error de-duplication.
//!
//! Each error kind reaches the UI at most once per viewing session. The
//! tally is reset when the location list becomes active and when it is
//! left.

use skycast_core::WeatherErrorKind;
use std::collections::HashSet;
use tracing::debug;

/// Tracks which error kinds were already surfaced.
#[derive(Debug, Default)]
pub struct ErrorTally {
    surfaced: HashSet<WeatherErrorKind>,
}

impl ErrorTally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `kind` and returns true if it was not surfaced yet.
    pub fn should_surface(&mut self, kind: WeatherErrorKind) -> bool {
        let first = self.surfaced.insert(kind);
        if !first {
            debug!(?kind, "Suppressing repeated error");
        }
        first
    }

    /// Returns true if `kind` was already surfaced this session.
    pub fn has_surfaced(&self, kind: WeatherErrorKind) -> bool {
        self.surfaced.contains(&kind)
    }

    /// Starts a new viewing session.
    pub fn reset(&mut self) {
        self.surfaced.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_only() {
        let mut tally = ErrorTally::new();
        assert!(tally.should_surface(WeatherErrorKind::NetworkError));
        assert!(!tally.should_surface(WeatherErrorKind::NetworkError));
        assert!(tally.should_surface(WeatherErrorKind::NoWeather));
        assert!(tally.has_surfaced(WeatherErrorKind::NetworkError));
    }

    #[test]
    fn test_reset_starts_new_session() {
        let mut tally = ErrorTally::new();
        tally.should_surface(WeatherErrorKind::InvalidKey);
        tally.reset();
        assert!(!tally.has_surfaced(WeatherErrorKind::InvalidKey));
        assert!(tally.should_surface(WeatherErrorKind::InvalidKey));
    }
}
