//! Weather-related types.
//!
//! This module contains types related to cached weather results:
//! - [`WeatherSnapshot`] - Cached conditions and forecast for one location
//! - [`ForecastDay`] - One day of forecast
//! - [`TemperatureUnit`] - Fahrenheit or Celsius
//! - [`RefreshInterval`] - How long a snapshot stays fresh

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::provider::WeatherSource;
use crate::error::CoreError;

// ============================================================================
// Temperature Unit
// ============================================================================

/// Temperature unit used when requesting and displaying weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TemperatureUnit {
    /// Degrees Fahrenheit.
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
    /// Degrees Celsius.
    #[serde(rename = "C")]
    Celsius,
}

impl TemperatureUnit {
    /// Returns the single-letter symbol ("F" or "C").
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Fahrenheit => "F",
            Self::Celsius => "C",
        }
    }

    /// Returns true for Fahrenheit.
    pub fn is_fahrenheit(&self) -> bool {
        matches!(self, Self::Fahrenheit)
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "°{}", self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            "c" | "celsius" => Ok(Self::Celsius),
            other => Err(CoreError::InvalidConfig(format!("unknown unit: {other}"))),
        }
    }
}

// ============================================================================
// Refresh Interval
// ============================================================================

/// How long a cached snapshot is served before it is re-fetched.
///
/// Persisted as a number of minutes; only the listed values are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum RefreshInterval {
    /// 15 minutes.
    FifteenMinutes,
    /// 30 minutes.
    #[default]
    ThirtyMinutes,
    /// 1 hour.
    OneHour,
    /// 3 hours.
    ThreeHours,
    /// 6 hours.
    SixHours,
}

impl RefreshInterval {
    /// All accepted intervals, shortest first.
    pub fn all() -> &'static [RefreshInterval] {
        &[
            Self::FifteenMinutes,
            Self::ThirtyMinutes,
            Self::OneHour,
            Self::ThreeHours,
            Self::SixHours,
        ]
    }

    /// Returns the interval in minutes.
    pub fn minutes(self) -> u32 {
        match self {
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::ThreeHours => 180,
            Self::SixHours => 360,
        }
    }

    /// Returns the interval as a chrono duration.
    pub fn as_duration(self) -> Duration {
        Duration::minutes(i64::from(self.minutes()))
    }

    /// Returns the interval as a std duration.
    pub fn as_std(self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.minutes()) * 60)
    }

    /// Looks up an interval by its minute count.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::all().iter().copied().find(|i| i.minutes() == minutes)
    }
}

impl TryFrom<u32> for RefreshInterval {
    type Error = CoreError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "refresh interval must be one of 15, 30, 60, 180, 360 minutes (got {minutes})"
            ))
        })
    }
}

impl From<RefreshInterval> for u32 {
    fn from(interval: RefreshInterval) -> Self {
        interval.minutes()
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.minutes();
        if minutes < 60 {
            write!(f, "{minutes} min")
        } else if minutes == 60 {
            f.write_str("1 hour")
        } else {
            write!(f, "{} hours", minutes / 60)
        }
    }
}

// ============================================================================
// Weather Snapshot
// ============================================================================

/// An immutable cached weather result for one location at one fetch time.
///
/// Snapshots are keyed by location query and replaced wholesale on every
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Query this snapshot was fetched for.
    pub query: String,
    /// Location name as reported by the provider.
    pub location_name: String,
    /// Current temperature in `unit`.
    pub temperature: f64,
    /// Apparent temperature, if reported.
    #[serde(default)]
    pub feels_like: Option<f64>,
    /// Short condition text (e.g., "Partly Cloudy").
    pub condition: String,
    /// Relative humidity in percent.
    #[serde(default)]
    pub humidity: Option<u8>,
    /// Wind speed (mph for Fahrenheit, km/h for Celsius).
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Daily forecast, today first.
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
    /// Unit the temperatures are expressed in.
    pub unit: TemperatureUnit,
    /// Provider that produced this snapshot.
    pub source: WeatherSource,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Creates a snapshot with only the current conditions set.
    pub fn new(
        query: impl Into<String>,
        source: WeatherSource,
        unit: TemperatureUnit,
        temperature: f64,
        condition: impl Into<String>,
    ) -> Self {
        let query = query.into();
        Self {
            location_name: query.clone(),
            query,
            temperature,
            feels_like: None,
            condition: condition.into(),
            humidity: None,
            wind_speed: None,
            forecast: Vec::new(),
            unit,
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Sets the fetch time.
    #[must_use]
    pub fn fetched_at(mut self, at: DateTime<Utc>) -> Self {
        self.fetched_at = at;
        self
    }

    /// Sets the location name.
    #[must_use]
    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = name.into();
        self
    }

    /// Returns the snapshot age relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
    }

    /// Returns true if the snapshot is younger than `max_age` at `now`.
    ///
    /// A snapshot stamped after `now` is never fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let age = self.age_at(now);
        age >= Duration::zero() && age < max_age
    }

    /// Returns true if the snapshot is younger than `max_age`.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.is_fresh_at(Utc::now(), max_age)
    }

    /// Returns true if this snapshot was produced by `source` in `unit`.
    pub fn matches(&self, source: WeatherSource, unit: TemperatureUnit) -> bool {
        self.source == source && self.unit == unit
    }

    /// Validates the snapshot data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if the query is empty, the
    /// temperature is not finite, or humidity exceeds 100.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.query.trim().is_empty() {
            return Err(CoreError::InvalidData("snapshot has an empty query".to_string()));
        }
        if !self.temperature.is_finite() {
            return Err(CoreError::InvalidData(
                "temperature is not a finite number".to_string(),
            ));
        }
        if let Some(humidity) = self.humidity {
            if humidity > 100 {
                return Err(CoreError::InvalidData(format!(
                    "humidity {humidity} out of valid range [0, 100]"
                )));
            }
        }
        for day in &self.forecast {
            day.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Forecast
// ============================================================================

/// One day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Calendar date of the forecast.
    pub date: NaiveDate,
    /// Expected high.
    pub high: f64,
    /// Expected low.
    pub low: f64,
    /// Short condition text.
    pub condition: String,
}

impl ForecastDay {
    /// Creates a forecast day.
    pub fn new(date: NaiveDate, high: f64, low: f64, condition: impl Into<String>) -> Self {
        Self {
            date,
            high,
            low,
            condition: condition.into(),
        }
    }

    /// Validates that high and low are finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if either bound is not finite or
    /// the low is above the high.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.high.is_finite() || !self.low.is_finite() {
            return Err(CoreError::InvalidData(format!(
                "forecast for {} has a non-finite temperature",
                self.date
            )));
        }
        if self.low > self.high {
            return Err(CoreError::InvalidData(format!(
                "forecast for {}: low {} above high {}",
                self.date, self.low, self.high
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot::new(
            "Seattle,WA",
            WeatherSource::WUnderground,
            TemperatureUnit::Fahrenheit,
            54.0,
            "Rain",
        )
    }

    #[test]
    fn test_freshness_window() {
        let t0 = Utc::now();
        let snap = snapshot().fetched_at(t0);
        let interval = Duration::minutes(30);

        assert!(snap.is_fresh_at(t0 + Duration::minutes(20), interval));
        assert!(!snap.is_fresh_at(t0 + Duration::minutes(31), interval));
        assert!(!snap.is_fresh_at(t0 + Duration::minutes(30), interval));
    }

    #[test]
    fn test_matches_source_and_unit() {
        let snap = snapshot();
        assert!(snap.matches(WeatherSource::WUnderground, TemperatureUnit::Fahrenheit));
        assert!(!snap.matches(WeatherSource::Yahoo, TemperatureUnit::Fahrenheit));
        assert!(!snap.matches(WeatherSource::WUnderground, TemperatureUnit::Celsius));
    }

    #[test]
    fn test_validate_rejects_bad_humidity() {
        let mut snap = snapshot();
        snap.humidity = Some(120);
        assert!(snap.validate().is_err());
        snap.humidity = Some(80);
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_forecast_low_above_high() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let day = ForecastDay::new(date, 40.0, 50.0, "Snow");
        assert!(day.validate().is_err());
    }

    #[test]
    fn test_refresh_interval_serde() {
        let json = serde_json::to_string(&RefreshInterval::ThreeHours).unwrap();
        assert_eq!(json, "180");
        let parsed: RefreshInterval = serde_json::from_str("15").unwrap();
        assert_eq!(parsed, RefreshInterval::FifteenMinutes);
        assert!(serde_json::from_str::<RefreshInterval>("45").is_err());
        assert_eq!(RefreshInterval::default().minutes(), 30);
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!("c".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Celsius);
        assert_eq!(
            "Fahrenheit".parse::<TemperatureUnit>().unwrap(),
            TemperatureUnit::Fahrenheit
        );
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }
}
