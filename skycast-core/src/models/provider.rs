//! Weather provider identity.
//!
//! - [`WeatherSource`] - Enum of supported weather providers
//! - [`ProviderMetadata`] - Display info and capabilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Weather Source
// ============================================================================

/// Supported weather providers.
///
/// Snapshots and location queries are provider-specific: a snapshot fetched
/// from one source is never comparable with one from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeatherSource {
    /// Weather Underground (requires an API key).
    #[default]
    #[serde(rename = "WUnderground", alias = "wunderground")]
    WUnderground,
    /// Yahoo Weather.
    #[serde(rename = "Yahoo", alias = "yahoo")]
    Yahoo,
}

impl WeatherSource {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WUnderground => "Weather Underground",
            Self::Yahoo => "Yahoo Weather",
        }
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::WUnderground => "wunderground",
            Self::Yahoo => "yahoo",
        }
    }

    /// Returns all available providers.
    pub fn all() -> &'static [WeatherSource] {
        &[Self::WUnderground, Self::Yahoo]
    }

    /// Returns true if the provider refuses requests without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::WUnderground)
    }

    /// Converts this provider to its position in [`WeatherSource::all`].
    pub fn to_index(self) -> usize {
        Self::all().iter().position(|&p| p == self).unwrap_or(0)
    }

    /// Creates a provider from its position in [`WeatherSource::all`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WeatherSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wunderground" | "wu" | "weatherunderground" => Ok(Self::WUnderground),
            "yahoo" | "yahooweather" => Ok(Self::Yahoo),
            other => Err(CoreError::InvalidConfig(format!("unknown provider: {other}"))),
        }
    }
}

// ============================================================================
// Provider Metadata
// ============================================================================

/// Static display information about a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Provider identifier.
    pub id: WeatherSource,
    /// Display name.
    pub display_name: String,
    /// Whether an API key is needed.
    pub requires_api_key: bool,
    /// Where users can sign up for a key.
    pub key_signup_url: Option<String>,
    /// Attribution text shown next to provider data.
    pub attribution: String,
}

impl ProviderMetadata {
    /// Creates metadata with the provider's defaults.
    pub fn new(id: WeatherSource) -> Self {
        Self {
            id,
            display_name: id.display_name().to_string(),
            requires_api_key: id.requires_api_key(),
            key_signup_url: None,
            attribution: format!("Data provided by {}", id.display_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("wu".parse::<WeatherSource>().unwrap(), WeatherSource::WUnderground);
        assert_eq!("Yahoo".parse::<WeatherSource>().unwrap(), WeatherSource::Yahoo);
        assert!("metoffice".parse::<WeatherSource>().is_err());
    }

    #[test]
    fn test_index_roundtrip() {
        for source in WeatherSource::all() {
            assert_eq!(WeatherSource::from_index(source.to_index()), Some(*source));
        }
        assert_eq!(WeatherSource::from_index(5), None);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(WeatherSource::WUnderground.requires_api_key());
        assert!(!WeatherSource::Yahoo.requires_api_key());
    }
}
