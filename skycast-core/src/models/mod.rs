//! Domain models for Skycast.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identity (WeatherSource, ProviderMetadata)
//! - [`weather`] - Cached weather (WeatherSnapshot, ForecastDay, units, intervals)
//! - [`location`] - Locations (LocationEntry, GeoPosition, LocationSuggestion)

mod location;
mod provider;
mod weather;

pub use location::{GeoPosition, LocationEntry, LocationSuggestion, LocationType};
pub use provider::{ProviderMetadata, WeatherSource};
pub use weather::{ForecastDay, RefreshInterval, TemperatureUnit, WeatherSnapshot};
