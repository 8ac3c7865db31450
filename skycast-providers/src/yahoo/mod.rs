//! Yahoo Weather provider implementation.
//!
//! Everything goes through the public YQL endpoint; no key is needed. A
//! location query is either place text (`"Paris, France"`) or a
//! `"lat,lon"` pair.

mod api;
mod error;
pub(crate) mod parser;

pub use api::{YqlEndpoint, YAHOO_API_BASE};
pub use error::YahooError;

use async_trait::async_trait;
use skycast_core::{
    GeoPosition, LocationSuggestion, TemperatureUnit, WeatherSnapshot, WeatherSource,
};
use skycast_fetch::{FetchContext, FetchError, WeatherProvider};
use tracing::{debug, instrument};

/// Yahoo Weather provider.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    endpoint: YqlEndpoint,
}

impl YahooProvider {
    /// Creates a provider against the public YQL service.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in base URL does not parse.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            endpoint: YqlEndpoint::new()?,
        })
    }

    /// Creates a provider against a custom endpoint.
    pub fn with_endpoint(endpoint: YqlEndpoint) -> Self {
        Self { endpoint }
    }

    async fn run(&self, ctx: &FetchContext, statement: &str) -> Result<String, FetchError> {
        let url = self.endpoint.url(statement);
        Ok(ctx.http.get(&url).await?.text().await?)
    }
}

#[async_trait]
impl WeatherProvider for YahooProvider {
    fn source(&self) -> WeatherSource {
        WeatherSource::Yahoo
    }

    #[instrument(skip(self, ctx, _api_key), fields(provider = "yahoo"))]
    async fn fetch_weather(
        &self,
        ctx: &FetchContext,
        query: &str,
        unit: TemperatureUnit,
        _api_key: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        let body = self.run(ctx, &api::forecast_statement(query, unit)).await?;
        let snapshot = parser::parse_forecast(&body, query, unit)?;
        debug!(temp = snapshot.temperature, "Fetched forecast");
        Ok(snapshot)
    }

    #[instrument(skip(self, ctx, _api_key), fields(provider = "yahoo"))]
    async fn resolve_position(
        &self,
        ctx: &FetchContext,
        position: GeoPosition,
        _api_key: &str,
    ) -> Result<Option<String>, FetchError> {
        let body = self.run(ctx, &api::reverse_statement(position)).await?;
        parser::parse_reverse(&body, position)
    }

    #[instrument(skip(self, ctx, _api_key), fields(provider = "yahoo"))]
    async fn search_locations(
        &self,
        ctx: &FetchContext,
        text: &str,
        _api_key: &str,
    ) -> Result<Vec<LocationSuggestion>, FetchError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let body = self.run(ctx, &api::search_statement(text)).await?;
        parser::parse_places(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_core::WeatherErrorKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> FetchContext {
        FetchContext::builder()
            .timeout(Duration::from_secs(5))
            .max_attempts(1)
            .build()
            .unwrap()
    }

    fn provider(server: &MockServer) -> YahooProvider {
        YahooProvider::with_endpoint(YqlEndpoint::with_base(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_weather_celsius() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/public/yql"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"count": 1, "results": {"channel": {
                    "location": {"city": "Paris", "country": "France"},
                    "item": {"condition": {"temp": "12", "text": "Sunny"}}
                }}}
            })))
            .mount(&mock_server)
            .await;

        let snap = provider(&mock_server)
            .fetch_weather(&ctx(), "Paris, France", TemperatureUnit::Celsius, "")
            .await
            .unwrap();
        assert_eq!(snap.location_name, "Paris, France");
        assert_eq!(snap.unit, TemperatureUnit::Celsius);
        assert_eq!(snap.source, WeatherSource::Yahoo);
    }

    #[tokio::test]
    async fn test_fetch_weather_no_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/public/yql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"count": 0, "results": null}
            })))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_weather(&ctx(), "Nowhere", TemperatureUnit::Fahrenheit, "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), WeatherErrorKind::NoWeather);
    }

    #[tokio::test]
    async fn test_validate_key_always_true() {
        let mock_server = MockServer::start().await;
        assert!(provider(&mock_server).validate_key(&ctx(), "").await.unwrap());
        assert!(!provider(&mock_server).requires_api_key());
    }
}
