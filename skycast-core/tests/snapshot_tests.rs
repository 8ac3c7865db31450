//! Integration tests for core snapshot types.

use chrono::{Duration, Utc};
use skycast_core::{
    ForecastDay, RefreshInterval, TemperatureUnit, WeatherSnapshot, WeatherSource,
};

fn seattle() -> WeatherSnapshot {
    WeatherSnapshot::new(
        "Seattle,WA",
        WeatherSource::WUnderground,
        TemperatureUnit::Fahrenheit,
        52.0,
        "Cloudy",
    )
}

#[test]
fn test_snapshot_fresh_within_interval() {
    let interval = RefreshInterval::ThirtyMinutes.as_duration();
    let snap = seattle().fetched_at(Utc::now() - Duration::minutes(20));
    assert!(snap.is_fresh(interval));

    let stale = seattle().fetched_at(Utc::now() - Duration::minutes(31));
    assert!(!stale.is_fresh(interval));
}

#[test]
fn test_snapshot_from_the_future_is_stale() {
    let interval = RefreshInterval::ThirtyMinutes.as_duration();
    let now = Utc::now();
    let ahead = seattle().fetched_at(now + Duration::days(10));
    assert!(!ahead.is_fresh_at(now, interval));
    assert!(!ahead.is_fresh(interval));

    let exact = seattle().fetched_at(now);
    assert!(exact.is_fresh_at(now, interval));
}

#[test]
fn test_snapshot_validation() {
    let mut snap = seattle();
    assert!(snap.validate().is_ok());

    snap.temperature = f64::NAN;
    assert!(snap.validate().is_err());

    let mut snap = seattle();
    snap.forecast.push(ForecastDay::new(
        Utc::now().date_naive(),
        f64::INFINITY,
        40.0,
        "Sun",
    ));
    assert!(snap.validate().is_err());
}
