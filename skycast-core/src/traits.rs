//! Trait definitions for Skycast.
//!
//! The UI collaborator implements [`WeatherListener`] to receive the results
//! of refresh cycles.

use crate::error::ClassifiedError;
use crate::models::{LocationEntry, WeatherSnapshot};

/// Receives weather results from the refresh orchestrator.
///
/// Callbacks may be invoked concurrently from several load tasks, so
/// implementations must not block.
pub trait WeatherListener: Send + Sync {
    /// Called when weather for `location` is available, cached or fresh.
    fn on_weather_loaded(&self, location: &LocationEntry, snapshot: &WeatherSnapshot);

    /// Called the first time an error kind occurs in a viewing session.
    fn on_weather_error(&self, error: &ClassifiedError);
}

/// A listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl WeatherListener for NoopListener {
    fn on_weather_loaded(&self, _location: &LocationEntry, _snapshot: &WeatherSnapshot) {}

    fn on_weather_error(&self, _error: &ClassifiedError) {}
}
