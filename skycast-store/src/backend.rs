//! Storage backends for the location store.
//!
//! [`Persistence`] is the seam between [`crate::LocationStore`] and disk.
//! [`JsonFilePersistence`] writes the three JSON documents;
//! [`MemoryPersistence`] keeps them in memory and counts writes.

use async_trait::async_trait;
use serde::Deserialize;
use skycast_core::{LocationEntry, LocationType, WeatherSnapshot};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{
    default_cache_dir, default_config_dir, load_json_opt, remove_file_if_exists, save_json,
    GPS_LOCATION_FILE, LOCATIONS_FILE, WEATHER_FILE,
};

/// Weather cache document: snapshots keyed by location query.
pub type WeatherCache = BTreeMap<String, WeatherSnapshot>;

// ============================================================================
// Persistence Trait
// ============================================================================

/// Durable storage for saved locations, the weather cache and the last
/// known GPS location.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Loads the saved manual locations in display order.
    async fn load_locations(&self) -> Result<Vec<LocationEntry>, StoreError>;

    /// Replaces the saved manual locations.
    async fn save_locations(&self, entries: &[LocationEntry]) -> Result<(), StoreError>;

    /// Loads the weather cache.
    async fn load_weather(&self) -> Result<WeatherCache, StoreError>;

    /// Replaces the weather cache.
    async fn save_weather(&self, cache: &WeatherCache) -> Result<(), StoreError>;

    /// Loads the last known GPS location.
    async fn load_gps(&self) -> Result<Option<LocationEntry>, StoreError>;

    /// Replaces or clears the last known GPS location.
    async fn save_gps(&self, entry: Option<&LocationEntry>) -> Result<(), StoreError>;
}

// ============================================================================
// Locations Document
// ============================================================================

/// One element of the locations document: a bare query string from older
/// versions or a full entry record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredLocation {
    Query(String),
    Entry(LocationEntry),
}

/// Normalizes a decoded locations document into manual entries, dropping
/// blank and repeated queries.
fn normalize_locations(stored: Vec<StoredLocation>) -> Vec<LocationEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(stored.len());
    for item in stored {
        let mut entry = match item {
            StoredLocation::Query(q) => LocationEntry::manual(q.trim()),
            StoredLocation::Entry(e) => e,
        };
        if entry.query.trim().is_empty() {
            warn!("Dropping saved location with empty query");
            continue;
        }
        if !seen.insert(entry.query.clone()) {
            warn!(query = %entry.query, "Dropping repeated saved location");
            continue;
        }
        entry.location_type = LocationType::Manual;
        entries.push(entry);
    }
    entries
}

/// Parses a locations document in either supported format.
pub fn parse_locations(json: &str) -> Result<Vec<LocationEntry>, StoreError> {
    let stored: Vec<StoredLocation> = serde_json::from_str(json)?;
    Ok(normalize_locations(stored))
}

// ============================================================================
// JSON Files
// ============================================================================

/// JSON documents on disk.
///
/// The locations document lives in the config directory; the weather cache
/// and the last GPS location are caches and live in the cache directory.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    locations_path: PathBuf,
    weather_path: PathBuf,
    gps_path: PathBuf,
}

impl JsonFilePersistence {
    /// Uses the given config and cache directories.
    pub fn new(config_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            locations_path: config_dir.join(LOCATIONS_FILE),
            weather_path: cache_dir.join(WEATHER_FILE),
            gps_path: cache_dir.join(GPS_LOCATION_FILE),
        }
    }

    /// Uses the platform config and cache directories.
    pub fn default_dirs() -> Self {
        Self::new(&default_config_dir(), &default_cache_dir())
    }

    /// Keeps all documents in one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir, dir)
    }

    /// Path of the locations document.
    pub fn locations_path(&self) -> &Path {
        &self.locations_path
    }

    /// Path of the weather cache.
    pub fn weather_path(&self) -> &Path {
        &self.weather_path
    }

    /// Path of the last GPS location.
    pub fn gps_path(&self) -> &Path {
        &self.gps_path
    }
}

#[async_trait]
impl Persistence for JsonFilePersistence {
    async fn load_locations(&self) -> Result<Vec<LocationEntry>, StoreError> {
        let stored: Option<Vec<StoredLocation>> = load_json_opt(&self.locations_path).await?;
        let entries = normalize_locations(stored.unwrap_or_default());
        debug!(count = entries.len(), "Loaded saved locations");
        Ok(entries)
    }

    async fn save_locations(&self, entries: &[LocationEntry]) -> Result<(), StoreError> {
        save_json(&self.locations_path, entries).await
    }

    async fn load_weather(&self) -> Result<WeatherCache, StoreError> {
        match load_json_opt(&self.weather_path).await {
            Ok(cache) => Ok(cache.unwrap_or_default()),
            Err(StoreError::Serialization(e)) => {
                warn!(error = %e, "Weather cache unreadable, starting empty");
                Ok(WeatherCache::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn save_weather(&self, cache: &WeatherCache) -> Result<(), StoreError> {
        save_json(&self.weather_path, cache).await
    }

    async fn load_gps(&self) -> Result<Option<LocationEntry>, StoreError> {
        match load_json_opt::<LocationEntry>(&self.gps_path).await {
            Ok(entry) => Ok(entry.map(|mut e| {
                e.location_type = LocationType::Gps;
                e
            })),
            Err(StoreError::Serialization(e)) => {
                warn!(error = %e, "Last GPS location unreadable, ignoring");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_gps(&self, entry: Option<&LocationEntry>) -> Result<(), StoreError> {
        match entry {
            Some(e) => save_json(&self.gps_path, e).await,
            None => remove_file_if_exists(&self.gps_path).await,
        }
    }
}

// ============================================================================
// In Memory
// ============================================================================

#[derive(Debug, Default)]
struct MemoryDocs {
    locations: Vec<LocationEntry>,
    weather: WeatherCache,
    gps: Option<LocationEntry>,
}

/// In-memory documents with write counters.
///
/// [`MemoryPersistence::fail_saves`] makes every write fail with an I/O
/// error, leaving the documents untouched.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    docs: Mutex<MemoryDocs>,
    location_saves: AtomicUsize,
    weather_saves: AtomicUsize,
    gps_saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryPersistence {
    /// Creates empty documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates documents seeded with saved locations and a GPS location.
    pub fn seeded(locations: Vec<LocationEntry>, gps: Option<LocationEntry>) -> Self {
        Self {
            docs: Mutex::new(MemoryDocs {
                locations,
                weather: WeatherCache::new(),
                gps,
            }),
            ..Self::default()
        }
    }

    /// Makes subsequent writes fail until called with `false`.
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }

    /// Number of times the locations document was written.
    pub fn location_saves(&self) -> usize {
        self.location_saves.load(Ordering::SeqCst)
    }

    /// Number of times the weather cache was written.
    pub fn weather_saves(&self) -> usize {
        self.weather_saves.load(Ordering::SeqCst)
    }

    /// Number of times the GPS location was written or cleared.
    pub fn gps_saves(&self) -> usize {
        self.gps_saves.load(Ordering::SeqCst)
    }

    /// Current locations document.
    pub async fn stored_locations(&self) -> Vec<LocationEntry> {
        self.docs.lock().await.locations.clone()
    }

    /// Current weather cache.
    pub async fn stored_weather(&self) -> WeatherCache {
        self.docs.lock().await.weather.clone()
    }

    /// Current GPS location.
    pub async fn stored_gps(&self) -> Option<LocationEntry> {
        self.docs.lock().await.gps.clone()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn load_locations(&self) -> Result<Vec<LocationEntry>, StoreError> {
        Ok(self.docs.lock().await.locations.clone())
    }

    async fn save_locations(&self, entries: &[LocationEntry]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.docs.lock().await.locations = entries.to_vec();
        self.location_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_weather(&self) -> Result<WeatherCache, StoreError> {
        Ok(self.docs.lock().await.weather.clone())
    }

    async fn save_weather(&self, cache: &WeatherCache) -> Result<(), StoreError> {
        self.check_writable()?;
        self.docs.lock().await.weather = cache.clone();
        self.weather_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_gps(&self) -> Result<Option<LocationEntry>, StoreError> {
        Ok(self.docs.lock().await.gps.clone())
    }

    async fn save_gps(&self, entry: Option<&LocationEntry>) -> Result<(), StoreError> {
        self.check_writable()?;
        self.docs.lock().await.gps = entry.cloned();
        self.gps_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
