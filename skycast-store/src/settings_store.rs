//! User settings with persistence.
//!
//! [`Settings`] is the process-wide configuration read by the refresh
//! orchestrator on every cycle. [`SettingsStore`] holds it behind a lock,
//! persists it through [`save_json`] and bumps a watch version on every
//! change.

use serde::{Deserialize, Serialize};
use skycast_core::{RefreshInterval, TemperatureUnit, WeatherSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Settings
// ============================================================================

/// User settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Track the device position as an extra location.
    pub follow_gps: bool,

    /// Active weather provider.
    pub api: WeatherSource,

    /// Key for providers that need one. May be empty.
    pub api_key: String,

    /// Whether `api_key` passed the provider's key check.
    pub api_key_verified: bool,

    /// How long a cached snapshot stays fresh.
    pub refresh_interval: RefreshInterval,

    /// Temperature unit.
    pub unit: TemperatureUnit,

    /// Set once weather has been loaded at least once.
    pub weather_loaded: bool,

    /// Log level used when no verbosity flag is given.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            follow_gps: false,
            api: WeatherSource::default(),
            api_key: String::new(),
            api_key_verified: false,
            refresh_interval: RefreshInterval::default(),
            unit: TemperatureUnit::default(),
            weather_loaded: false,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Returns true if the key is non-blank.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Returns true if the active provider needs a key and none is set.
    pub fn missing_api_key(&self) -> bool {
        self.api.requires_api_key() && !self.has_api_key()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("follow_gps", &self.follow_gps)
            .field("api", &self.api)
            .field("api_key", &if self.has_api_key() { "<set>" } else { "<empty>" })
            .field("api_key_verified", &self.api_key_verified)
            .field("refresh_interval", &self.refresh_interval)
            .field("unit", &self.unit)
            .field("weather_loaded", &self.weather_loaded)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
///
/// Cloning shares the same settings.
#[derive(Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: Option<PathBuf>,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store with default settings saved to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(Settings::default(), Some(path))
    }

    /// Creates a store that never touches disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_settings(settings, None)
    }

    fn with_settings(settings: Settings, path: Option<PathBuf>) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Currently infallible; unreadable settings fall back to defaults.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path, falling back to defaults when the file
    /// is missing or unreadable.
    ///
    /// # Errors
    ///
    /// Currently infallible; unreadable settings fall back to defaults.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };
        Ok(Self::with_settings(settings, Some(path)))
    }

    /// Returns the settings file path, if backed by disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk. A no-op for in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let settings = self.settings.read().await.clone();
        save_json(path, &settings).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Updates, notifies and saves.
    async fn update_and_save<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Settings),
    {
        self.update(f).await;
        self.save().await
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Sets GPS following.
    pub async fn set_follow_gps(&self, value: bool) -> Result<(), StoreError> {
        self.update_and_save(|s| s.follow_gps = value).await
    }

    /// Sets the active provider.
    pub async fn set_api(&self, api: WeatherSource) -> Result<(), StoreError> {
        self.update_and_save(|s| s.api = api).await
    }

    /// Stores an API key and its verification state.
    pub async fn set_api_key(&self, key: &str, verified: bool) -> Result<(), StoreError> {
        let key = key.trim().to_string();
        self.update_and_save(|s| {
            s.api_key = key;
            s.api_key_verified = verified;
        })
        .await
    }

    /// Sets only the key verification flag.
    pub async fn set_api_key_verified(&self, verified: bool) -> Result<(), StoreError> {
        self.update_and_save(|s| s.api_key_verified = verified).await
    }

    /// Sets the refresh interval.
    pub async fn set_refresh_interval(&self, interval: RefreshInterval) -> Result<(), StoreError> {
        self.update_and_save(|s| s.refresh_interval = interval).await
    }

    /// Sets the temperature unit.
    pub async fn set_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError> {
        self.update_and_save(|s| s.unit = unit).await
    }

    /// Records that weather has been loaded.
    pub async fn set_weather_loaded(&self, value: bool) -> Result<(), StoreError> {
        if self.settings.read().await.weather_loaded == value {
            return Ok(());
        }
        self.update_and_save(|s| s.weather_loaded = value).await
    }

    /// Sets the log level.
    pub async fn set_log_level(&self, level: LogLevel) -> Result<(), StoreError> {
        self.update_and_save(|s| s.log_level = level).await
    }

    /// Restores defaults and saves.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.update_and_save(|s| *s = Settings::default()).await
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.follow_gps);
        assert_eq!(settings.api, WeatherSource::WUnderground);
        assert_eq!(settings.refresh_interval, RefreshInterval::ThirtyMinutes);
        assert_eq!(settings.unit, TemperatureUnit::Fahrenheit);
        assert!(settings.missing_api_key());
    }

    #[test]
    fn test_debug_hides_key() {
        let settings = Settings {
            api_key: "abcdef123".to_string(),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("abcdef123"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api": "yahoo", "refresh_interval": 60}"#).unwrap();
        assert_eq!(settings.api, WeatherSource::Yahoo);
        assert_eq!(settings.refresh_interval, RefreshInterval::OneHour);
        assert_eq!(settings.unit, TemperatureUnit::Fahrenheit);
        assert!(!settings.missing_api_key());
    }

    #[tokio::test]
    async fn test_settings_store_update_notifies() {
        let store = SettingsStore::in_memory(Settings::default());
        let mut rx = store.subscribe();

        store.set_follow_gps(true).await.unwrap();

        assert!(store.get().await.follow_gps);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn test_set_api_key_trims() {
        let store = SettingsStore::in_memory(Settings::default());
        store.set_api_key("  key123 ", true).await.unwrap();
        let settings = store.get().await;
        assert_eq!(settings.api_key, "key123");
        assert!(settings.api_key_verified);
    }

    #[tokio::test]
    async fn test_setters_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());

        store.set_unit(TemperatureUnit::Celsius).await.unwrap();
        store.set_refresh_interval(RefreshInterval::SixHours).await.unwrap();

        let reloaded = SettingsStore::load(path).await.unwrap().get().await;
        assert_eq!(reloaded.unit, TemperatureUnit::Celsius);
        assert_eq!(reloaded.refresh_interval, RefreshInterval::SixHours);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = SettingsStore::load(path).await.unwrap();
        assert_eq!(store.get().await, Settings::default());
    }
}
