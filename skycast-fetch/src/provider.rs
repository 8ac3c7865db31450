//! Weather provider trait.
//!
//! A provider turns a location query into a [`WeatherSnapshot`] and offers
//! the lookups that produce queries in the first place: reverse geocoding
//! of a device position and free-text autocomplete.
//!
//! ## Implementing a Provider
//!
//! ```ignore
//! struct MyProvider;
//!
//! #[async_trait]
//! impl WeatherProvider for MyProvider {
//!     fn source(&self) -> WeatherSource {
//!         WeatherSource::Yahoo
//!     }
//!
//!     async fn fetch_weather(
//!         &self,
//!         ctx: &FetchContext,
//!         query: &str,
//!         unit: TemperatureUnit,
//!         api_key: &str,
//!     ) -> Result<WeatherSnapshot, FetchError> {
//!         let url = build_url(query)?;
//!         let body = ctx.http.get_json(&url).await?;
//!         parse(body, query, unit)
//!     }
//!
//!     // ...
//! }
//! ```

use async_trait::async_trait;
use skycast_core::{
    GeoPosition, LocationSuggestion, ProviderMetadata, TemperatureUnit, WeatherSnapshot,
    WeatherSource,
};

use crate::context::FetchContext;
use crate::error::FetchError;

/// A source of weather data, geocoding and location search.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Which provider this is.
    fn source(&self) -> WeatherSource;

    /// Display metadata.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new(self.source())
    }

    /// Returns true if requests need a non-empty API key.
    fn requires_api_key(&self) -> bool {
        self.source().requires_api_key()
    }

    /// Fetches current conditions and forecast for `query`.
    async fn fetch_weather(
        &self,
        ctx: &FetchContext,
        query: &str,
        unit: TemperatureUnit,
        api_key: &str,
    ) -> Result<WeatherSnapshot, FetchError>;

    /// Resolves a device position into a provider query.
    ///
    /// `Ok(None)` means the provider knows no location for the position.
    async fn resolve_position(
        &self,
        ctx: &FetchContext,
        position: GeoPosition,
        api_key: &str,
    ) -> Result<Option<String>, FetchError>;

    /// Returns autocomplete suggestions for free text.
    async fn search_locations(
        &self,
        ctx: &FetchContext,
        text: &str,
        api_key: &str,
    ) -> Result<Vec<LocationSuggestion>, FetchError>;

    /// Checks whether `key` is accepted by the provider.
    ///
    /// Providers without keys accept everything.
    async fn validate_key(&self, ctx: &FetchContext, key: &str) -> Result<bool, FetchError> {
        let _ = (ctx, key);
        Ok(true)
    }
}
