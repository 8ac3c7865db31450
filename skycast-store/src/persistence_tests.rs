//! Persistence round-trip and edge case tests.
//!
//! Exercises the JSON helpers and a location store backed by real files.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::backend::JsonFilePersistence;
use crate::location_store::LocationStore;
use crate::persistence::{load_json, load_json_or_default, save_json};
use crate::settings_store::{LogLevel, Settings};
use skycast_core::{
    GeoPosition, LocationEntry, RefreshInterval, TemperatureUnit, WeatherSnapshot, WeatherSource,
};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");

    let settings = Settings {
        follow_gps: true,
        api: WeatherSource::Yahoo,
        refresh_interval: RefreshInterval::ThreeHours,
        unit: TemperatureUnit::Celsius,
        log_level: LogLevel::Debug,
        ..Settings::default()
    };

    save_json(&file_path, &settings).await.unwrap();
    let loaded: Settings = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_settings_document_shape() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");
    save_json(&file_path, &Settings::default()).await.unwrap();

    let raw: serde_json::Value = load_json(&file_path).await.unwrap();
    assert_eq!(raw["api"], "WUnderground");
    assert_eq!(raw["refresh_interval"], 30);
    assert_eq!(raw["unit"], "F");
    assert_eq!(raw["log_level"], "warn");
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();
    assert!(nested_path.exists());
    assert!(!nested_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/settings.json");

    let result: Result<Settings, _> = load_json(&file_path).await;
    assert!(result.is_err());

    let fallback: Settings = load_json_or_default(&file_path).await;
    assert_eq!(fallback, Settings::default());
}

// ============================================================================
// Location Store On Disk
// ============================================================================

#[tokio::test]
async fn test_location_store_survives_restart() {
    let config = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let files = || Arc::new(JsonFilePersistence::new(config.path(), cache.path()));

    {
        let store = LocationStore::load(files()).await.unwrap();
        store.add(LocationEntry::manual("Seattle, WA")).await.unwrap();
        store.add(LocationEntry::manual("Paris, France")).await.unwrap();
        store.reorder(1, 0).await.unwrap();
        store
            .set_snapshot(
                "Seattle, WA",
                WeatherSnapshot::new(
                    "Seattle, WA",
                    WeatherSource::WUnderground,
                    TemperatureUnit::Fahrenheit,
                    52.0,
                    "Overcast",
                ),
            )
            .await
            .unwrap();
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        store
            .set_gps_entry(Some(LocationEntry::gps("47.6000,-122.3000", pos)))
            .await
            .unwrap();
    }

    let store = LocationStore::load(files()).await.unwrap();
    let queries: Vec<_> = store.entries().await.into_iter().map(|e| e.query).collect();
    assert_eq!(queries, vec!["Paris, France", "Seattle, WA"]);
    assert_eq!(store.snapshot("Seattle, WA").await.unwrap().temperature, 52.0);
    assert_eq!(
        store.get("Seattle, WA").await.unwrap().weather_source,
        Some(WeatherSource::WUnderground)
    );
    assert!(store.gps_entry().await.unwrap().is_gps());

    assert!(config.path().join("locations.json").exists());
    assert!(cache.path().join("weather.json").exists());
    assert!(cache.path().join("gps_location.json").exists());
}

#[tokio::test]
async fn test_legacy_locations_document() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(
        dir.path().join("locations.json"),
        r#"["Seattle, WA", "Portland, OR"]"#,
    )
    .await
    .unwrap();

    let store = LocationStore::load(Arc::new(JsonFilePersistence::in_dir(dir.path())))
        .await
        .unwrap();
    assert_eq!(store.len().await, 2);
    assert_eq!(store.home().await.unwrap().query, "Seattle, WA");
}
