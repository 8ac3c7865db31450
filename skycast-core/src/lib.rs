// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Skycast Core
//!
//! Core types, models, and traits shared by every Skycast crate.
//!
//! ## Key Types
//!
//! ### Locations
//! - [`LocationEntry`] - A saved or GPS-tracked location
//! - [`GeoPosition`] - Latitude/longitude pair
//! - [`LocationSuggestion`] - Autocomplete result
//!
//! ### Weather
//! - [`WeatherSnapshot`] - Cached weather for one location
//! - [`WeatherSource`] - The two supported providers
//! - [`TemperatureUnit`] / [`RefreshInterval`] - User preferences
//!
//! ### Errors
//! - [`WeatherErrorKind`] - User-facing failure kinds
//! - [`ClassifiedError`] - A failure as delivered to the UI

pub mod error;
pub mod models;
pub mod traits;

pub use error::{ClassifiedError, CoreError, WeatherErrorKind};

pub use models::{
    // Provider types
    ProviderMetadata,
    WeatherSource,
    // Weather types
    ForecastDay,
    RefreshInterval,
    TemperatureUnit,
    WeatherSnapshot,
    // Location types
    GeoPosition,
    LocationEntry,
    LocationSuggestion,
    LocationType,
};

pub use traits::{NoopListener, WeatherListener};
