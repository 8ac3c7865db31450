//! Location-related types.
//!
//! - [`LocationEntry`] - A saved or GPS-tracked location
//! - [`LocationType`] - GPS or manually added
//! - [`GeoPosition`] - Latitude/longitude pair
//! - [`LocationSuggestion`] - One autocomplete result

use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::WeatherSource;
use crate::error::CoreError;

// ============================================================================
// Location Type
// ============================================================================

/// How a location entered the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Tracked from the device position.
    Gps,
    /// Added by the user.
    #[default]
    Manual,
}

// ============================================================================
// Geo Position
// ============================================================================

/// A device or place position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl GeoPosition {
    /// Creates a position, rejecting out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if either coordinate is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidData(format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidData(format!("longitude {longitude} out of range")));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses `"lat,lon"`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` for malformed input.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidData(format!("expected 'lat,lon', got '{s}'")))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidData(format!("invalid latitude '{lat}'")))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidData(format!("invalid longitude '{lon}'")))?;
        Self::new(lat, lon)
    }

    /// Formats the position as a `"lat,lon"` query with the given precision.
    pub fn to_query(&self, precision: usize) -> String {
        format!(
            "{:.prec$},{:.prec$}",
            self.latitude,
            self.longitude,
            prec = precision
        )
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

// ============================================================================
// Location Entry
// ============================================================================

/// A location known to the store.
///
/// `query` is the unique key across manual entries and the GPS slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Provider-specific identifier.
    pub query: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// GPS or manual.
    #[serde(default)]
    pub location_type: LocationType,
    /// Coordinates, when known.
    #[serde(default)]
    pub position: Option<GeoPosition>,
    /// Provider last used to fetch weather for this entry.
    #[serde(default)]
    pub weather_source: Option<WeatherSource>,
}

impl LocationEntry {
    /// Creates a manual entry.
    pub fn manual(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            name: query.clone(),
            query,
            location_type: LocationType::Manual,
            position: None,
            weather_source: None,
        }
    }

    /// Creates a GPS entry for a resolved position.
    pub fn gps(query: impl Into<String>, position: GeoPosition) -> Self {
        let query = query.into();
        Self {
            name: query.clone(),
            query,
            location_type: LocationType::Gps,
            position: Some(position),
            weather_source: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns true for the GPS-tracked entry.
    pub fn is_gps(&self) -> bool {
        self.location_type == LocationType::Gps
    }

    /// Returns the display name, falling back to the query.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.query
        } else {
            &self.name
        }
    }
}

// ============================================================================
// Location Suggestion
// ============================================================================

/// One autocomplete result from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    /// Display name (e.g., "Seattle, Washington").
    pub name: String,
    /// Provider query to use when the suggestion is chosen. May be empty
    /// for placeholder rows.
    pub query: String,
    /// Coordinates, if the provider reported them.
    #[serde(default)]
    pub position: Option<GeoPosition>,
}

impl LocationSuggestion {
    /// Creates a suggestion.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            position: None,
        }
    }

    /// Returns true if choosing this suggestion yields a usable query.
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Converts the suggestion into a manual entry.
    pub fn to_entry(&self) -> LocationEntry {
        let mut entry = LocationEntry::manual(self.query.clone()).with_name(self.name.clone());
        entry.position = self.position;
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parse() {
        let pos = GeoPosition::parse("47.6, -122.3").unwrap();
        assert!((pos.latitude - 47.6).abs() < f64::EPSILON);
        assert!((pos.longitude + 122.3).abs() < f64::EPSILON);
        assert_eq!(pos.to_query(1), "47.6,-122.3");
    }

    #[test]
    fn test_position_out_of_range() {
        assert!(GeoPosition::new(91.0, 0.0).is_err());
        assert!(GeoPosition::new(0.0, -181.0).is_err());
        assert!(GeoPosition::parse("north,south").is_err());
        assert!(GeoPosition::parse("47.6").is_err());
    }

    #[test]
    fn test_entry_constructors() {
        let manual = LocationEntry::manual("Seattle,WA");
        assert!(!manual.is_gps());
        assert_eq!(manual.display_name(), "Seattle,WA");

        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        let gps = LocationEntry::gps("47.6,-122.3", pos).with_name("Seattle");
        assert!(gps.is_gps());
        assert_eq!(gps.display_name(), "Seattle");
    }

    #[test]
    fn test_suggestion_without_query() {
        let empty = LocationSuggestion::new("No results found", "");
        assert!(!empty.has_query());

        let found = LocationSuggestion::new("Seattle, Washington", "/q/zmw:98101.1.99999");
        assert!(found.has_query());
        assert_eq!(found.to_entry().name, "Seattle, Washington");
    }
}
