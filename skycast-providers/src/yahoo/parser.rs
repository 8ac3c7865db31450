//! YQL response parser.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skycast_core::{
    ForecastDay, GeoPosition, LocationSuggestion, TemperatureUnit, WeatherSnapshot, WeatherSource,
};
use skycast_fetch::FetchError;
use tracing::{debug, warn};

use super::error::YahooError;
use crate::lenient::{opt_f64, Lenient, OneOrMany};

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct YqlResponse {
    #[serde(default)]
    pub query: Option<YqlQuery>,
    #[serde(default)]
    pub error: Option<YqlError>,
}

#[derive(Debug, Deserialize)]
pub struct YqlQuery {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub results: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct YqlError {
    #[serde(default)]
    pub description: String,
}

/// Unwraps the envelope; `Ok(None)` when nothing matched.
fn results<T: DeserializeOwned>(body: &str) -> Result<Option<T>, FetchError> {
    let response: YqlResponse = serde_json::from_str(body)?;
    if let Some(err) = response.error {
        return Err(YahooError::Yql(err.description).into());
    }
    let Some(query) = response.query else {
        return Err(FetchError::InvalidResponse("YQL body has no query".to_string()));
    };
    match query.results {
        Some(value) if query.count > 0 && !value.is_null() => Ok(Some(serde_json::from_value(value)?)),
        _ => Ok(None),
    }
}

// ============================================================================
// Weather
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResults {
    pub channel: OneOrMany<Channel>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub location: Option<ChannelLocation>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub atmosphere: Option<Atmosphere>,
    #[serde(default)]
    pub item: Option<Item>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

impl ChannelLocation {
    fn display(&self) -> String {
        [self.city.trim(), self.region.trim(), self.country.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub chill: Option<Lenient>,
    #[serde(default)]
    pub speed: Option<Lenient>,
}

#[derive(Debug, Deserialize)]
pub struct Atmosphere {
    #[serde(default)]
    pub humidity: Option<Lenient>,
}

#[derive(Debug, Deserialize)]
pub struct Item {
    pub condition: Condition,
    #[serde(default)]
    pub forecast: Vec<Forecast>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub temp: Lenient,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Forecast {
    pub date: String,
    pub high: Lenient,
    pub low: Lenient,
    #[serde(default)]
    pub text: String,
}

/// Parses a `weather.forecast` body into a snapshot.
pub fn parse_forecast(
    body: &str,
    query: &str,
    unit: TemperatureUnit,
) -> Result<WeatherSnapshot, FetchError> {
    debug!(len = body.len(), "Parsing Yahoo forecast");

    let parsed: ForecastResults =
        results(body)?.ok_or_else(|| YahooError::NoResults(query.to_string()))?;
    let channel = parsed
        .channel
        .into_vec()
        .into_iter()
        .next()
        .ok_or_else(|| YahooError::NoResults(query.to_string()))?;
    let item = channel
        .item
        .ok_or_else(|| YahooError::MissingItem(query.to_string()))?;

    let temperature = item
        .condition
        .temp
        .as_f64()
        .ok_or_else(|| FetchError::NoData("condition has no temperature".to_string()))?;

    let mut snapshot = WeatherSnapshot::new(
        query,
        WeatherSource::Yahoo,
        unit,
        temperature,
        item.condition.text,
    );
    if let Some(location) = channel.location.as_ref() {
        let name = location.display();
        if !name.is_empty() {
            snapshot.location_name = name;
        }
    }
    if let Some(wind) = channel.wind.as_ref() {
        snapshot.feels_like = opt_f64(wind.chill.as_ref());
        snapshot.wind_speed = opt_f64(wind.speed.as_ref());
    }
    snapshot.humidity = channel
        .atmosphere
        .as_ref()
        .and_then(|a| a.humidity.as_ref())
        .and_then(Lenient::as_percent);

    snapshot.forecast = item
        .forecast
        .iter()
        .filter_map(|f| {
            let Ok(date) = NaiveDate::parse_from_str(f.date.trim(), "%d %b %Y") else {
                warn!(date = %f.date, "Skipping forecast day with unparseable date");
                return None;
            };
            Some(ForecastDay::new(date, f.high.as_f64()?, f.low.as_f64()?, f.text.clone()))
        })
        .collect();

    snapshot.validate()?;
    Ok(snapshot)
}

// ============================================================================
// Places
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaceResults {
    pub place: OneOrMany<Place>,
}

#[derive(Debug, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub admin1: Option<Named>,
    #[serde(default)]
    pub country: Option<Named>,
    #[serde(default)]
    pub centroid: Option<Centroid>,
}

#[derive(Debug, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Centroid {
    pub latitude: Lenient,
    pub longitude: Lenient,
}

impl Place {
    /// `"name, region, country"` with empty parts dropped.
    fn display(&self) -> String {
        let region = self.admin1.as_ref().map(|n| n.content.trim()).unwrap_or_default();
        let country = self.country.as_ref().map(|n| n.content.trim()).unwrap_or_default();
        [self.name.trim(), region, country]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn position(&self) -> Option<GeoPosition> {
        let c = self.centroid.as_ref()?;
        GeoPosition::new(c.latitude.as_f64()?, c.longitude.as_f64()?).ok()
    }
}

fn places(body: &str) -> Result<Vec<Place>, FetchError> {
    Ok(results::<PlaceResults>(body)?
        .map(|r| r.place.into_vec())
        .unwrap_or_default())
}

/// Parses a reverse lookup. The position itself is the query when a place
/// exists there.
pub fn parse_reverse(body: &str, position: GeoPosition) -> Result<Option<String>, FetchError> {
    let found = places(body)?.into_iter().any(|p| !p.display().is_empty());
    Ok(found.then(|| position.to_query(4)))
}

/// Parses a place search into suggestions. Place text is the query.
pub fn parse_places(body: &str) -> Result<Vec<LocationSuggestion>, FetchError> {
    Ok(places(body)?
        .into_iter()
        .filter_map(|p| {
            let name = p.display();
            if name.is_empty() {
                return None;
            }
            let mut suggestion = LocationSuggestion::new(name.clone(), name);
            suggestion.position = p.position();
            Some(suggestion)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_core::WeatherErrorKind;

    const FORECAST: &str = r#"{"query": {"count": 1, "results": {"channel": {
        "location": {"city": "Seattle", "region": " WA", "country": "United States"},
        "wind": {"chill": "50", "speed": "7"},
        "atmosphere": {"humidity": "81"},
        "item": {
            "condition": {"temp": "53", "text": "Showers"},
            "forecast": [
                {"date": "01 Mar 2024", "high": "55", "low": "45", "text": "Rain"},
                {"date": "not a date", "high": "50", "low": "40", "text": "Cloudy"}
            ]
        }
    }}}}"#;

    #[test]
    fn test_parse_forecast() {
        let snap = parse_forecast(FORECAST, "Seattle, WA", TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(snap.location_name, "Seattle, WA, United States");
        assert_eq!(snap.temperature, 53.0);
        assert_eq!(snap.feels_like, Some(50.0));
        assert_eq!(snap.humidity, Some(81));
        assert_eq!(snap.source, WeatherSource::Yahoo);
        assert_eq!(snap.forecast.len(), 1);
        assert_eq!(snap.forecast[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_zero_count_is_no_weather() {
        let body = r#"{"query": {"count": 0, "results": null}}"#;
        let err = parse_forecast(body, "Nowhere", TemperatureUnit::Fahrenheit).unwrap_err();
        assert_eq!(err.kind(), WeatherErrorKind::NoWeather);
    }

    #[test]
    fn test_channel_without_item() {
        let body = r#"{"query": {"count": 1, "results": {"channel": {"location": {"city": "X"}}}}}"#;
        let err = parse_forecast(body, "X", TemperatureUnit::Fahrenheit).unwrap_err();
        assert!(matches!(err, FetchError::NoData(_)));
    }

    #[test]
    fn test_yql_error() {
        let body = r#"{"error": {"lang": "en-US", "description": "Query syntax error"}}"#;
        let err = parse_forecast(body, "X", TemperatureUnit::Fahrenheit).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_places_single_and_many() {
        let single = r#"{"query": {"count": 1, "results": {"place": {
            "name": "Paris", "admin1": {"content": "Ile-de-France"}, "country": {"content": "France"},
            "centroid": {"latitude": "48.85", "longitude": "2.35"}
        }}}}"#;
        let results = parse_places(single).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].query, "Paris, Ile-de-France, France");
        assert!(results[0].position.is_some());

        let many = r#"{"query": {"count": 2, "results": {"place": [
            {"name": "Portland", "admin1": {"content": "Oregon"}},
            {"name": "Portland", "admin1": {"content": "Maine"}}
        ]}}}"#;
        assert_eq!(parse_places(many).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_reverse() {
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        let found = r#"{"query": {"count": 1, "results": {"place": {"name": "Seattle"}}}}"#;
        assert_eq!(parse_reverse(found, pos).unwrap().as_deref(), Some("47.6000,-122.3000"));

        let none = r#"{"query": {"count": 0, "results": null}}"#;
        assert_eq!(parse_reverse(none, pos).unwrap(), None);
    }
}
