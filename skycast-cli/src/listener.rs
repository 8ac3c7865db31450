//! Listener that collects orchestrator events for printing.

use skycast_core::{ClassifiedError, LocationEntry, WeatherListener, WeatherSnapshot};
use std::sync::{Mutex, PoisonError};

/// Records errors and counts loads; the command prints them afterwards.
#[derive(Debug, Default)]
pub struct CollectingListener {
    errors: Mutex<Vec<ClassifiedError>>,
    loaded: Mutex<usize>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the errors reported so far.
    pub fn take_errors(&self) -> Vec<ClassifiedError> {
        std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of weather results delivered.
    pub fn loaded(&self) -> usize {
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WeatherListener for CollectingListener {
    fn on_weather_loaded(&self, _location: &LocationEntry, _snapshot: &WeatherSnapshot) {
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn on_weather_error(&self, error: &ClassifiedError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.clone());
    }
}
