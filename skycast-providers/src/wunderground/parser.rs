//! Weather Underground response parser.

use chrono::NaiveDate;
use serde::Deserialize;
use skycast_core::{
    ForecastDay, GeoPosition, LocationSuggestion, TemperatureUnit, WeatherSnapshot, WeatherSource,
};
use skycast_fetch::FetchError;
use tracing::debug;

use super::error::WuError;
use crate::lenient::{opt_f64, Lenient};

// ============================================================================
// Response Types
// ============================================================================

/// Top-level body shared by every feature endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct WuResponse {
    #[serde(default)]
    pub response: Option<WuMeta>,
    #[serde(default)]
    pub current_observation: Option<WuObservation>,
    #[serde(default)]
    pub forecast: Option<WuForecast>,
    #[serde(default)]
    pub location: Option<WuLocation>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WuMeta {
    #[serde(default)]
    pub error: Option<WuApiError>,
}

#[derive(Debug, Deserialize)]
pub struct WuApiError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WuObservation {
    #[serde(default)]
    pub display_location: Option<WuDisplayLocation>,
    #[serde(default)]
    pub temp_f: Option<Lenient>,
    #[serde(default)]
    pub temp_c: Option<Lenient>,
    #[serde(default)]
    pub feelslike_f: Option<Lenient>,
    #[serde(default)]
    pub feelslike_c: Option<Lenient>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub relative_humidity: Option<Lenient>,
    #[serde(default)]
    pub wind_mph: Option<Lenient>,
    #[serde(default)]
    pub wind_kph: Option<Lenient>,
}

#[derive(Debug, Deserialize)]
pub struct WuDisplayLocation {
    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Deserialize)]
pub struct WuForecast {
    #[serde(default)]
    pub simpleforecast: Option<WuSimpleForecast>,
}

#[derive(Debug, Deserialize)]
pub struct WuSimpleForecast {
    #[serde(default)]
    pub forecastday: Vec<WuForecastDay>,
}

#[derive(Debug, Deserialize)]
pub struct WuForecastDay {
    pub date: WuDate,
    pub high: WuTemperature,
    pub low: WuTemperature,
    #[serde(default)]
    pub conditions: String,
}

#[derive(Debug, Deserialize)]
pub struct WuDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct WuTemperature {
    #[serde(default)]
    pub fahrenheit: Option<Lenient>,
    #[serde(default)]
    pub celsius: Option<Lenient>,
}

impl WuTemperature {
    fn value(&self, unit: TemperatureUnit) -> Option<f64> {
        match unit {
            TemperatureUnit::Fahrenheit => opt_f64(self.fahrenheit.as_ref()),
            TemperatureUnit::Celsius => opt_f64(self.celsius.as_ref()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WuLocation {
    /// Canonical query path, e.g. `/q/zmw:98101.1.99999`.
    #[serde(default)]
    pub l: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Autocomplete body. The service uses an upper-case key.
#[derive(Debug, Default, Deserialize)]
pub struct WuAutocomplete {
    #[serde(default, rename = "RESULTS")]
    pub results: Vec<WuAutocompleteResult>,
}

#[derive(Debug, Deserialize)]
pub struct WuAutocompleteResult {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub l: String,
    #[serde(default)]
    pub lat: Option<Lenient>,
    #[serde(default)]
    pub lon: Option<Lenient>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Returns the embedded API error, if the body carries one.
pub fn check_error(response: &WuResponse) -> Result<(), WuError> {
    match response.response.as_ref().and_then(|m| m.error.as_ref()) {
        Some(err) => Err(WuError::from_type(&err.kind, err.description.as_deref())),
        None => Ok(()),
    }
}

/// Parses a `conditions/forecast` body into a snapshot.
pub fn parse_conditions(
    body: &str,
    query: &str,
    unit: TemperatureUnit,
) -> Result<WeatherSnapshot, FetchError> {
    debug!(len = body.len(), "Parsing Weather Underground conditions");

    let response: WuResponse = serde_json::from_str(body)?;
    check_error(&response)?;

    let obs = response
        .current_observation
        .ok_or_else(|| FetchError::NoData("response has no current_observation".to_string()))?;

    let (temp, feels, wind) = match unit {
        TemperatureUnit::Fahrenheit => (&obs.temp_f, &obs.feelslike_f, &obs.wind_mph),
        TemperatureUnit::Celsius => (&obs.temp_c, &obs.feelslike_c, &obs.wind_kph),
    };
    let temperature = opt_f64(temp.as_ref())
        .ok_or_else(|| FetchError::NoData("observation has no temperature".to_string()))?;

    let mut snapshot = WeatherSnapshot::new(
        query,
        WeatherSource::WUnderground,
        unit,
        temperature,
        obs.weather.clone().unwrap_or_default(),
    );
    if let Some(display) = obs.display_location.as_ref().filter(|d| !d.full.is_empty()) {
        snapshot.location_name.clone_from(&display.full);
    }
    snapshot.feels_like = opt_f64(feels.as_ref());
    snapshot.wind_speed = opt_f64(wind.as_ref());
    snapshot.humidity = obs.relative_humidity.as_ref().and_then(Lenient::as_percent);

    if let Some(days) = response.forecast.and_then(|f| f.simpleforecast) {
        snapshot.forecast = days
            .forecastday
            .iter()
            .filter_map(|day| {
                let date = NaiveDate::from_ymd_opt(day.date.year, day.date.month, day.date.day)?;
                let high = day.high.value(unit)?;
                let low = day.low.value(unit)?;
                Some(ForecastDay::new(date, high, low, day.conditions.clone()))
            })
            .collect();
    }

    snapshot.validate()?;
    Ok(snapshot)
}

/// Parses a `geolookup` body into a query.
///
/// `querynotfound` means the position has no known location and yields
/// `Ok(None)`.
pub fn parse_geolookup(body: &str) -> Result<Option<String>, FetchError> {
    let response: WuResponse = serde_json::from_str(body)?;
    match check_error(&response) {
        Ok(()) => {}
        Err(WuError::QueryNotFound(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    Ok(response
        .location
        .map(|loc| loc.l)
        .filter(|l| !l.trim().is_empty()))
}

/// Parses an autocomplete body, keeping only city results.
pub fn parse_autocomplete(body: &str) -> Result<Vec<LocationSuggestion>, FetchError> {
    let response: WuAutocomplete = serde_json::from_str(body)?;
    Ok(response
        .results
        .into_iter()
        .filter(|r| r.kind.is_empty() || r.kind == "city")
        .map(|r| {
            let mut suggestion = LocationSuggestion::new(r.name, r.l);
            if let (Some(lat), Some(lon)) = (opt_f64(r.lat.as_ref()), opt_f64(r.lon.as_ref())) {
                suggestion.position = GeoPosition::new(lat, lon).ok();
            }
            suggestion
        })
        .collect())
}

/// Returns false only when the body reports `keynotfound`.
pub fn parse_key_check(body: &str) -> Result<bool, FetchError> {
    let response: WuResponse = serde_json::from_str(body)?;
    match check_error(&response) {
        Err(WuError::KeyNotFound(_)) => Ok(false),
        _ => Ok(true),
    }
}
