//! Weather Underground provider implementation.
//!
//! Every feature request carries the API key in the path; autocomplete is a
//! separate keyless host. Errors are reported inside a 200 body under
//! `response.error`.

mod api;
mod error;
pub(crate) mod parser;

pub use api::{WuEndpoints, WU_API_BASE, WU_AUTOCOMPLETE_BASE};
pub use error::WuError;

use async_trait::async_trait;
use skycast_core::{
    GeoPosition, LocationSuggestion, ProviderMetadata, TemperatureUnit, WeatherSnapshot,
    WeatherSource,
};
use skycast_fetch::{FetchContext, FetchError, WeatherProvider};
use tracing::{debug, instrument};

/// Key signup page shown when no key is configured.
pub const WU_KEY_SIGNUP_URL: &str = "https://www.wunderground.com/weather/api";

/// Weather Underground provider.
#[derive(Debug, Clone)]
pub struct WUndergroundProvider {
    endpoints: WuEndpoints,
}

impl WUndergroundProvider {
    /// Creates a provider against the public service.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in base URLs do not parse.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            endpoints: WuEndpoints::new()?,
        })
    }

    /// Creates a provider against custom endpoints.
    pub fn with_endpoints(endpoints: WuEndpoints) -> Self {
        Self { endpoints }
    }

    fn require_key(api_key: &str) -> Result<&str, FetchError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(WuError::MissingKey.into());
        }
        Ok(key)
    }
}

#[async_trait]
impl WeatherProvider for WUndergroundProvider {
    fn source(&self) -> WeatherSource {
        WeatherSource::WUnderground
    }

    fn metadata(&self) -> ProviderMetadata {
        let mut meta = ProviderMetadata::new(WeatherSource::WUnderground);
        meta.key_signup_url = Some(WU_KEY_SIGNUP_URL.to_string());
        meta
    }

    #[instrument(skip(self, ctx, api_key), fields(provider = "wunderground"))]
    async fn fetch_weather(
        &self,
        ctx: &FetchContext,
        query: &str,
        unit: TemperatureUnit,
        api_key: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        let key = Self::require_key(api_key)?;
        let url = self.endpoints.conditions(key, query)?;
        let body = ctx.http.get(&url).await?.text().await?;
        let snapshot = parser::parse_conditions(&body, query, unit)?;
        debug!(temp = snapshot.temperature, "Fetched conditions");
        Ok(snapshot)
    }

    #[instrument(skip(self, ctx, api_key), fields(provider = "wunderground"))]
    async fn resolve_position(
        &self,
        ctx: &FetchContext,
        position: GeoPosition,
        api_key: &str,
    ) -> Result<Option<String>, FetchError> {
        let key = Self::require_key(api_key)?;
        let url = self.endpoints.geolookup(key, position)?;
        let body = ctx.http.get(&url).await?.text().await?;
        parser::parse_geolookup(&body)
    }

    #[instrument(skip(self, ctx, _api_key), fields(provider = "wunderground"))]
    async fn search_locations(
        &self,
        ctx: &FetchContext,
        text: &str,
        _api_key: &str,
    ) -> Result<Vec<LocationSuggestion>, FetchError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoints.autocomplete(text.trim())?;
        let body = ctx.http.get(&url).await?.text().await?;
        parser::parse_autocomplete(&body)
    }

    #[instrument(skip(self, ctx, key), fields(provider = "wunderground"))]
    async fn validate_key(&self, ctx: &FetchContext, key: &str) -> Result<bool, FetchError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(false);
        }
        let url = self.endpoints.key_check(key)?;
        let response = match ctx.http.get(&url).await {
            Ok(response) => response,
            Err(FetchError::AuthenticationFailed(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        parser::parse_key_check(&response.text().await?)
    }
}
