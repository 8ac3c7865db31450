//! Scripted collaborators for orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use skycast_core::{
    ClassifiedError, GeoPosition, LocationEntry, LocationSuggestion, TemperatureUnit,
    WeatherErrorKind, WeatherListener, WeatherSnapshot, WeatherSource,
};
use skycast_fetch::{FetchContext, FetchError, WeatherProvider};
use skycast_providers::ProviderRegistry;
use skycast_refresh::{AccessStatus, Locator, LocatorError, Orchestrator, SettingsPolicy};
use skycast_store::{LocationStore, MemoryPersistence, Settings, SettingsStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Provider
// ============================================================================

/// How a scripted fetch fails.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Network,
    NoData,
}

/// A provider answering from a script and counting calls.
pub struct ScriptedProvider {
    source: WeatherSource,
    temperature: f64,
    failures: Mutex<HashMap<String, Failure>>,
    fetched: Mutex<Vec<String>>,
    delay: Option<std::time::Duration>,
    empty_geocode: Mutex<bool>,
    valid_key: Option<String>,
    suggestions: Vec<LocationSuggestion>,
}

impl ScriptedProvider {
    pub fn new(source: WeatherSource, temperature: f64) -> Self {
        Self {
            source,
            temperature,
            failures: Mutex::new(HashMap::new()),
            fetched: Mutex::new(Vec::new()),
            delay: None,
            empty_geocode: Mutex::new(false),
            valid_key: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_valid_key(mut self, key: &str) -> Self {
        self.valid_key = Some(key.to_string());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<LocationSuggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn fail(&self, query: &str, failure: Failure) {
        self.failures.lock().unwrap().insert(query.to_string(), failure);
    }

    pub fn heal(&self, query: &str) {
        self.failures.lock().unwrap().remove(query);
    }

    pub fn set_empty_geocode(&self, empty: bool) {
        *self.empty_geocode.lock().unwrap() = empty;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    fn source(&self) -> WeatherSource {
        self.source
    }

    async fn fetch_weather(
        &self,
        _ctx: &FetchContext,
        query: &str,
        unit: TemperatureUnit,
        _api_key: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        self.fetched.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().unwrap().get(query).copied();
        match failure {
            Some(Failure::Network) => Err(FetchError::Timeout(10)),
            Some(Failure::NoData) => Err(FetchError::NoData(format!("nothing for {query}"))),
            None => Ok(WeatherSnapshot::new(
                query,
                self.source,
                unit,
                self.temperature,
                "Clear",
            )),
        }
    }

    async fn resolve_position(
        &self,
        _ctx: &FetchContext,
        position: GeoPosition,
        _api_key: &str,
    ) -> Result<Option<String>, FetchError> {
        if *self.empty_geocode.lock().unwrap() {
            return Ok(None);
        }
        Ok(Some(position.to_query(1)))
    }

    async fn search_locations(
        &self,
        _ctx: &FetchContext,
        _text: &str,
        _api_key: &str,
    ) -> Result<Vec<LocationSuggestion>, FetchError> {
        Ok(self.suggestions.clone())
    }

    async fn validate_key(&self, _ctx: &FetchContext, key: &str) -> Result<bool, FetchError> {
        Ok(self.valid_key.as_deref() == Some(key))
    }
}

// ============================================================================
// Locator
// ============================================================================

/// A locator with a settable position and access answer.
pub struct ScriptedLocator {
    position: Mutex<Option<GeoPosition>>,
    access: Mutex<AccessStatus>,
    access_requests: AtomicUsize,
}

impl ScriptedLocator {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Mutex::new(Some(GeoPosition::new(latitude, longitude).unwrap())),
            access: Mutex::new(AccessStatus::Allowed),
            access_requests: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            position: Mutex::new(None),
            access: Mutex::new(AccessStatus::Denied),
            access_requests: AtomicUsize::new(0),
        }
    }

    pub fn move_to(&self, latitude: f64, longitude: f64) {
        *self.position.lock().unwrap() = Some(GeoPosition::new(latitude, longitude).unwrap());
    }

    pub fn lose_fix(&self) {
        *self.position.lock().unwrap() = None;
    }

    pub fn set_access(&self, status: AccessStatus) {
        *self.access.lock().unwrap() = status;
    }

    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Locator for ScriptedLocator {
    async fn position(
        &self,
        _max_age: std::time::Duration,
        _timeout: std::time::Duration,
    ) -> Result<GeoPosition, LocatorError> {
        self.position
            .lock()
            .unwrap()
            .ok_or(LocatorError::AccessDenied)
    }

    async fn request_access(&self) -> AccessStatus {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        *self.access.lock().unwrap()
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Records every callback.
#[derive(Default)]
pub struct RecordingListener {
    loaded: Mutex<Vec<String>>,
    errors: Mutex<Vec<ClassifiedError>>,
}

impl RecordingListener {
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ClassifiedError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn error_kinds(&self) -> Vec<WeatherErrorKind> {
        self.errors().into_iter().map(|e| e.kind).collect()
    }
}

impl WeatherListener for RecordingListener {
    fn on_weather_loaded(&self, location: &LocationEntry, _snapshot: &WeatherSnapshot) {
        self.loaded.lock().unwrap().push(location.query.clone());
    }

    fn on_weather_error(&self, error: &ClassifiedError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub settings: SettingsStore,
    pub locations: LocationStore,
    pub persistence: Arc<MemoryPersistence>,
    pub wunderground: Arc<ScriptedProvider>,
    pub yahoo: Arc<ScriptedProvider>,
    pub locator: Arc<ScriptedLocator>,
    pub listener: Arc<RecordingListener>,
    pub registry: ProviderRegistry,
}

impl Harness {
    pub fn new(settings: Settings, locator: ScriptedLocator) -> Self {
        Self::with_providers(
            settings,
            locator,
            ScriptedProvider::new(WeatherSource::WUnderground, 70.0).with_valid_key("good-key"),
            ScriptedProvider::new(WeatherSource::Yahoo, 20.0),
        )
    }

    pub fn with_providers(
        settings: Settings,
        locator: ScriptedLocator,
        wunderground: ScriptedProvider,
        yahoo: ScriptedProvider,
    ) -> Self {
        let settings = SettingsStore::in_memory(settings);
        let persistence = Arc::new(MemoryPersistence::new());
        let locations = LocationStore::new(persistence.clone());
        let wunderground = Arc::new(wunderground);
        let yahoo = Arc::new(yahoo);
        let registry = ProviderRegistry::empty()
            .with(wunderground.clone())
            .with(yahoo.clone());
        let locator = Arc::new(locator);
        let listener = Arc::new(RecordingListener::default());

        let orchestrator = Orchestrator::new(
            settings.clone(),
            locations.clone(),
            registry.clone(),
            FetchContext::new().unwrap(),
        )
        .with_locator(locator.clone())
        .with_listener(listener.clone());

        Self {
            orchestrator,
            settings,
            locations,
            persistence,
            wunderground,
            yahoo,
            locator,
            listener,
            registry,
        }
    }

    pub fn policy(&self) -> SettingsPolicy {
        SettingsPolicy::new(
            self.settings.clone(),
            self.locations.clone(),
            self.registry.clone(),
            FetchContext::new().unwrap(),
            self.locator.clone(),
        )
    }

    pub async fn save(&self, queries: &[&str]) {
        for q in queries {
            self.locations.add(LocationEntry::manual(*q)).await.unwrap();
        }
    }

    /// Caches a snapshot fetched `minutes_ago`.
    pub async fn cache(
        &self,
        query: &str,
        source: WeatherSource,
        unit: TemperatureUnit,
        minutes_ago: i64,
    ) {
        let snapshot = WeatherSnapshot::new(query, source, unit, 50.0, "Cached")
            .fetched_at(Utc::now() - Duration::minutes(minutes_ago));
        self.locations.set_snapshot(query, snapshot).await.unwrap();
    }

    pub fn total_fetches(&self) -> usize {
        self.wunderground.fetch_count() + self.yahoo.fetch_count()
    }
}

pub fn yahoo_settings() -> Settings {
    Settings {
        api: WeatherSource::Yahoo,
        ..Settings::default()
    }
}

pub fn wunderground_settings() -> Settings {
    Settings {
        api: WeatherSource::WUnderground,
        api_key: "good-key".to_string(),
        api_key_verified: true,
        ..Settings::default()
    }
}

pub fn no_gps() -> ScriptedLocator {
    let locator = ScriptedLocator::denied();
    locator.set_access(AccessStatus::Unspecified);
    locator
}

pub fn distinct(items: &[String]) -> HashSet<String> {
    items.iter().cloned().collect()
}
