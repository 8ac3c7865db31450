//! Saved locations and the per-location weather cache.
//!
//! The store owns the ordered list of manual locations, the single GPS
//! slot and the snapshots keyed by query. Structural mutations are
//! persisted through the injected [`Persistence`] and announced on a
//! broadcast channel.

use skycast_core::{LocationEntry, LocationType, WeatherSnapshot};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::backend::{Persistence, WeatherCache};
use crate::error::StoreError;

/// Capacity of the event channel; slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 64;

// ============================================================================
// Events
// ============================================================================

/// Change notifications emitted by [`LocationStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationEvent {
    /// A manual entry was appended.
    Added {
        /// Query of the new entry.
        query: String,
        /// Its index in the manual list.
        index: usize,
    },
    /// A manual entry was removed.
    Removed {
        /// Query of the removed entry.
        query: String,
        /// Index it was removed from.
        index: usize,
    },
    /// A manual entry was moved.
    Reordered {
        /// Original index.
        from: usize,
        /// New index.
        to: usize,
    },
    /// The GPS slot changed.
    GpsChanged {
        /// Query now in the slot, `None` when cleared.
        query: Option<String>,
    },
    /// One or no manual entries remain; reordering makes no sense.
    ReorderUnavailable,
}

// ============================================================================
// Inner State
// ============================================================================

#[derive(Debug, Default)]
struct LocationStoreInner {
    /// Manual entries in display order.
    entries: Vec<LocationEntry>,
    /// The GPS-tracked entry.
    gps: Option<LocationEntry>,
    /// Snapshots by query.
    snapshots: WeatherCache,
}

impl LocationStoreInner {
    fn contains(&self, query: &str) -> bool {
        self.gps.as_ref().is_some_and(|g| g.query == query)
            || self.entries.iter().any(|e| e.query == query)
    }
}

// ============================================================================
// Location Store
// ============================================================================

/// Thread-safe location store.
#[derive(Clone)]
pub struct LocationStore {
    inner: Arc<RwLock<LocationStoreInner>>,
    persistence: Arc<dyn Persistence>,
    /// Serializes mutations so documents reach disk in mutation order.
    writer: Arc<Mutex<()>>,
    events: broadcast::Sender<LocationEvent>,
}

impl LocationStore {
    /// Creates an empty store.
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self::from_inner(LocationStoreInner::default(), persistence)
    }

    fn from_inner(inner: LocationStoreInner, persistence: Arc<dyn Persistence>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(inner)),
            persistence,
            writer: Arc::new(Mutex::new(())),
            events,
        }
    }

    /// Restores the saved list, the last GPS location and the weather cache.
    ///
    /// Snapshots for queries no longer saved are dropped. A last GPS
    /// location that collides with a manual entry is ignored.
    ///
    /// # Errors
    ///
    /// Fails when a document exists but cannot be read.
    pub async fn load(persistence: Arc<dyn Persistence>) -> Result<Self, StoreError> {
        let entries = persistence.load_locations().await?;
        let mut gps = persistence.load_gps().await?;
        let mut snapshots = persistence.load_weather().await?;

        if let Some(g) = gps.as_ref() {
            if entries.iter().any(|e| e.query == g.query) {
                warn!(query = %g.query, "Last GPS location duplicates a saved location, ignoring");
                gps = None;
            }
        }

        let mut inner = LocationStoreInner {
            entries,
            gps,
            snapshots: WeatherCache::new(),
        };
        snapshots.retain(|query, _| inner.contains(query));
        inner.snapshots = snapshots;

        info!(
            locations = inner.entries.len(),
            gps = inner.gps.is_some(),
            snapshots = inner.snapshots.len(),
            "Location store loaded"
        );
        Ok(Self::from_inner(inner, persistence))
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: LocationEvent) {
        debug!(?event, "Location event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the manual entries in display order.
    pub async fn entries(&self) -> Vec<LocationEntry> {
        self.inner.read().await.entries.clone()
    }

    /// Returns the number of manual entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Returns true if there are no manual entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Returns the GPS entry.
    pub async fn gps_entry(&self) -> Option<LocationEntry> {
        self.inner.read().await.gps.clone()
    }

    /// Returns the GPS entry when present, otherwise the first manual entry.
    pub async fn home(&self) -> Option<LocationEntry> {
        let inner = self.inner.read().await;
        inner.gps.clone().or_else(|| inner.entries.first().cloned())
    }

    /// Looks up an entry (manual or GPS) by query.
    pub async fn get(&self, query: &str) -> Option<LocationEntry> {
        let inner = self.inner.read().await;
        inner
            .gps
            .iter()
            .chain(inner.entries.iter())
            .find(|e| e.query == query)
            .cloned()
    }

    /// Returns true if the query is saved (manual or GPS).
    pub async fn contains(&self, query: &str) -> bool {
        self.inner.read().await.contains(query)
    }

    /// Returns the cached snapshot for a query.
    pub async fn snapshot(&self, query: &str) -> Option<WeatherSnapshot> {
        self.inner.read().await.snapshots.get(query).cloned()
    }

    /// Returns the whole weather cache.
    pub async fn snapshots(&self) -> WeatherCache {
        self.inner.read().await.snapshots.clone()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Appends a manual entry.
    ///
    /// # Errors
    ///
    /// `DuplicateLocation` if the query is already saved, manual or GPS.
    /// On any error, persistence failures included, the store is left
    /// unchanged.
    pub async fn add(&self, mut entry: LocationEntry) -> Result<LocationEntry, StoreError> {
        let _writer = self.writer.lock().await;
        entry.location_type = LocationType::Manual;

        let mut entries = {
            let inner = self.inner.read().await;
            if inner.contains(&entry.query) {
                return Err(StoreError::DuplicateLocation(entry.query));
            }
            inner.entries.clone()
        };
        entries.push(entry.clone());
        let index = entries.len() - 1;

        self.persistence.save_locations(&entries).await?;
        self.inner.write().await.entries = entries;

        info!(query = %entry.query, index, "Location added");
        self.emit(LocationEvent::Added {
            query: entry.query.clone(),
            index,
        });
        Ok(entry)
    }

    /// Removes a manual entry and its cached snapshot.
    ///
    /// # Errors
    ///
    /// `LocationNotFound` if no manual entry has this query. The entry
    /// stays in the store when a document cannot be saved.
    pub async fn remove(&self, query: &str) -> Result<LocationEntry, StoreError> {
        let _writer = self.writer.lock().await;

        let (index, mut entries, mut snapshots) = {
            let inner = self.inner.read().await;
            let Some(index) = inner.entries.iter().position(|e| e.query == query) else {
                return Err(StoreError::LocationNotFound(query.to_string()));
            };
            (index, inner.entries.clone(), inner.snapshots.clone())
        };
        let removed = entries.remove(index);
        let had_snapshot = snapshots.remove(query).is_some();

        self.persistence.save_locations(&entries).await?;
        if had_snapshot {
            self.persistence.save_weather(&snapshots).await?;
        }
        let remaining = entries.len();
        {
            let mut inner = self.inner.write().await;
            inner.entries = entries;
            inner.snapshots = snapshots;
        }

        info!(query, index, "Location removed");
        self.emit(LocationEvent::Removed {
            query: query.to_string(),
            index,
        });
        if remaining <= 1 {
            self.emit(LocationEvent::ReorderUnavailable);
        }
        Ok(removed)
    }

    /// Moves a manual entry from one index to another.
    ///
    /// One call is one completed gesture and is persisted once.
    /// `from == to` changes and persists nothing.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` if either index is out of range. The list is left
    /// unchanged on any error.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let mut entries = {
            let inner = self.inner.read().await;
            let len = inner.entries.len();
            if from >= len || to >= len {
                return Err(StoreError::InvalidIndex { from, to, len });
            }
            if from == to {
                return Ok(());
            }
            inner.entries.clone()
        };
        let moved = entries.remove(from);
        entries.insert(to, moved);

        self.persistence.save_locations(&entries).await?;
        self.inner.write().await.entries = entries;

        debug!(from, to, "Location moved");
        self.emit(LocationEvent::Reordered { from, to });
        Ok(())
    }

    /// Replaces the GPS slot and persists it as the last known GPS location.
    ///
    /// Clearing the slot also drops its snapshot and saves the list and the
    /// weather cache.
    ///
    /// # Errors
    ///
    /// `DuplicateLocation` if the query belongs to a manual entry. The slot
    /// is left unchanged on any error.
    pub async fn set_gps_entry(&self, entry: Option<LocationEntry>) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let entry = entry.map(|mut e| {
            e.location_type = LocationType::Gps;
            e
        });

        let (previous, entries, mut snapshots) = {
            let inner = self.inner.read().await;
            if let Some(e) = entry.as_ref() {
                if inner.entries.iter().any(|m| m.query == e.query) {
                    return Err(StoreError::DuplicateLocation(e.query.clone()));
                }
            }
            (
                inner.gps.as_ref().map(|g| g.query.clone()),
                inner.entries.clone(),
                inner.snapshots.clone(),
            )
        };
        if let Some(old) = previous.as_deref() {
            if entry.as_ref().is_none_or(|e| e.query != old) {
                snapshots.remove(old);
            }
        }

        self.persistence.save_gps(entry.as_ref()).await?;
        if entry.is_none() {
            self.persistence.save_locations(&entries).await?;
            self.persistence.save_weather(&snapshots).await?;
        }
        {
            let mut inner = self.inner.write().await;
            inner.gps = entry.clone();
            inner.snapshots = snapshots;
        }

        let query = entry.map(|e| e.query);
        if previous != query {
            info!(query = ?query, "GPS location changed");
            self.emit(LocationEvent::GpsChanged { query });
        }
        Ok(())
    }

    /// Overwrites the snapshot for a query and persists the weather cache.
    ///
    /// The matching entry's `weather_source` is updated to the snapshot's
    /// provider.
    ///
    /// # Errors
    ///
    /// Persistence failures; the cache keeps its previous snapshot.
    pub async fn set_snapshot(
        &self,
        query: &str,
        snapshot: WeatherSnapshot,
    ) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let source = snapshot.source;
        let (mut snapshots, mut entries, mut gps) = {
            let inner = self.inner.read().await;
            (inner.snapshots.clone(), inner.entries.clone(), inner.gps.clone())
        };
        snapshots.insert(query.to_string(), snapshot);

        let mut entries_changed = false;
        if let Some(e) = entries.iter_mut().find(|e| e.query == query) {
            if e.weather_source != Some(source) {
                e.weather_source = Some(source);
                entries_changed = true;
            }
        }
        let mut gps_changed = false;
        if let Some(g) = gps.as_mut().filter(|g| g.query == query) {
            if g.weather_source != Some(source) {
                g.weather_source = Some(source);
                gps_changed = true;
            }
        }

        self.persistence.save_weather(&snapshots).await?;
        if entries_changed {
            self.persistence.save_locations(&entries).await?;
        }
        if gps_changed {
            self.persistence.save_gps(gps.as_ref()).await?;
        }
        {
            let mut inner = self.inner.write().await;
            inner.snapshots = snapshots;
            inner.entries = entries;
            inner.gps = gps;
        }

        debug!(query, provider = ?source, "Snapshot cached");
        Ok(())
    }
}

impl std::fmt::Debug for LocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationStore").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryPersistence;
    use skycast_core::{GeoPosition, TemperatureUnit, WeatherSource};

    fn store() -> (LocationStore, Arc<MemoryPersistence>) {
        let memory = Arc::new(MemoryPersistence::new());
        (LocationStore::new(memory.clone()), memory)
    }

    async fn seeded(queries: &[&str]) -> (LocationStore, Arc<MemoryPersistence>) {
        let (store, memory) = store();
        for q in queries {
            store.add(LocationEntry::manual(*q)).await.unwrap();
        }
        (store, memory)
    }

    async fn queries(store: &LocationStore) -> Vec<String> {
        store.entries().await.into_iter().map(|e| e.query).collect()
    }

    fn snap(query: &str) -> WeatherSnapshot {
        WeatherSnapshot::new(query, WeatherSource::Yahoo, TemperatureUnit::Fahrenheit, 60.0, "Clear")
    }

    #[tokio::test]
    async fn test_add_and_events() {
        let (store, memory) = store();
        let mut rx = store.subscribe();

        store.add(LocationEntry::manual("Seattle, WA")).await.unwrap();

        assert_eq!(queries(&store).await, vec!["Seattle, WA"]);
        assert_eq!(memory.location_saves(), 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            LocationEvent::Added {
                query: "Seattle, WA".to_string(),
                index: 0
            }
        );
    }

    #[tokio::test]
    async fn test_add_duplicate_leaves_store_unchanged() {
        let (store, memory) = seeded(&["Seattle, WA", "Paris, France"]).await;
        let saves = memory.location_saves();

        let err = store.add(LocationEntry::manual("Seattle, WA")).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateLocation(q) if q == "Seattle, WA"));
        assert_eq!(queries(&store).await, vec!["Seattle, WA", "Paris, France"]);
        assert_eq!(memory.location_saves(), saves);
    }

    #[tokio::test]
    async fn test_add_duplicate_of_gps() {
        let (store, _) = store();
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        store
            .set_gps_entry(Some(LocationEntry::gps("47.6,-122.3", pos)))
            .await
            .unwrap();

        let err = store.add(LocationEntry::manual("47.6,-122.3")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateLocation(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_emits_reorder_unavailable() {
        let (store, _) = seeded(&["A", "B", "C"]).await;
        store.set_snapshot("B", snap("B")).await.unwrap();
        let mut rx = store.subscribe();

        store.remove("B").await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            LocationEvent::Removed {
                query: "B".to_string(),
                index: 1
            }
        );
        assert!(store.snapshot("B").await.is_none());

        store.remove("A").await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), LocationEvent::Removed { .. }));
        assert_eq!(rx.recv().await.unwrap(), LocationEvent::ReorderUnavailable);
        assert_eq!(queries(&store).await, vec!["C"]);
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let (store, _) = seeded(&["A"]).await;
        assert!(matches!(
            store.remove("Z").await,
            Err(StoreError::LocationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_is_a_permutation() {
        let (store, memory) = seeded(&["A", "B", "C", "D"]).await;
        let saves = memory.location_saves();

        store.reorder(0, 2).await.unwrap();
        assert_eq!(queries(&store).await, vec!["B", "C", "A", "D"]);
        store.reorder(3, 0).await.unwrap();
        assert_eq!(queries(&store).await, vec!["D", "B", "C", "A"]);

        let mut sorted = queries(&store).await;
        sorted.sort();
        assert_eq!(sorted, vec!["A", "B", "C", "D"]);

        assert_eq!(memory.location_saves(), saves + 2);
        assert_eq!(memory.stored_locations().await, store.entries().await);
    }

    #[tokio::test]
    async fn test_reorder_same_index_is_noop() {
        let (store, memory) = seeded(&["A", "B"]).await;
        let saves = memory.location_saves();
        store.reorder(1, 1).await.unwrap();
        assert_eq!(memory.location_saves(), saves);
    }

    #[tokio::test]
    async fn test_reorder_out_of_range() {
        let (store, _) = seeded(&["A", "B"]).await;
        let err = store.reorder(0, 2).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidIndex { from: 0, to: 2, len: 2 }));
        assert_eq!(queries(&store).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_gps_slot() {
        let (store, memory) = seeded(&["Seattle, WA"]).await;
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        let mut rx = store.subscribe();

        store
            .set_gps_entry(Some(LocationEntry::manual("47.6,-122.3").with_name("Here")))
            .await
            .unwrap();
        let gps = store.gps_entry().await.unwrap();
        assert!(gps.is_gps());
        assert_eq!(store.home().await.unwrap().query, "47.6,-122.3");
        assert_eq!(memory.stored_gps().await.unwrap().query, "47.6,-122.3");
        assert_eq!(
            rx.recv().await.unwrap(),
            LocationEvent::GpsChanged {
                query: Some("47.6,-122.3".to_string())
            }
        );

        store.set_snapshot("47.6,-122.3", snap("47.6,-122.3")).await.unwrap();
        let saves = memory.location_saves();
        store.set_gps_entry(None).await.unwrap();
        assert!(store.gps_entry().await.is_none());
        assert!(store.snapshot("47.6,-122.3").await.is_none());
        assert!(memory.stored_gps().await.is_none());
        assert_eq!(memory.location_saves(), saves + 1);
        assert_eq!(store.home().await.unwrap().query, "Seattle, WA");

        let dup = store
            .set_gps_entry(Some(LocationEntry::gps("Seattle, WA", pos)))
            .await;
        assert!(matches!(dup, Err(StoreError::DuplicateLocation(_))));
    }

    #[tokio::test]
    async fn test_set_snapshot_records_source() {
        let (store, memory) = seeded(&["Paris, France"]).await;
        store.set_snapshot("Paris, France", snap("Paris, France")).await.unwrap();

        let entry = store.get("Paris, France").await.unwrap();
        assert_eq!(entry.weather_source, Some(WeatherSource::Yahoo));
        assert_eq!(memory.stored_weather().await.len(), 1);
        assert_eq!(
            memory.stored_locations().await[0].weather_source,
            Some(WeatherSource::Yahoo)
        );
    }

    #[tokio::test]
    async fn test_load_restores_and_prunes() {
        let memory = Arc::new(MemoryPersistence::seeded(
            vec![LocationEntry::manual("A"), LocationEntry::manual("B")],
            Some(LocationEntry::manual("A")),
        ));
        let mut cache = WeatherCache::new();
        cache.insert("A".to_string(), snap("A"));
        cache.insert("Gone".to_string(), snap("Gone"));
        memory.save_weather(&cache).await.unwrap();

        let store = LocationStore::load(memory).await.unwrap();
        assert_eq!(queries(&store).await, vec!["A", "B"]);
        assert!(store.gps_entry().await.is_none());
        assert!(store.snapshot("A").await.is_some());
        assert!(store.snapshot("Gone").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_add_leaves_store_unchanged() {
        let (store, memory) = seeded(&["Paris, France"]).await;
        let mut rx = store.subscribe();
        memory.fail_saves(true);

        let err = store.add(LocationEntry::manual("Seattle, WA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(queries(&store).await, vec!["Paris, France"]);
        assert!(rx.try_recv().is_err());

        memory.fail_saves(false);
        store.add(LocationEntry::manual("Seattle, WA")).await.unwrap();
        assert_eq!(queries(&store).await, vec!["Paris, France", "Seattle, WA"]);
        assert_eq!(memory.stored_locations().await, store.entries().await);
    }

    #[tokio::test]
    async fn test_failed_remove_and_reorder_leave_store_unchanged() {
        let (store, memory) = seeded(&["A", "B", "C"]).await;
        store.set_snapshot("B", snap("B")).await.unwrap();
        memory.fail_saves(true);

        assert!(matches!(store.remove("B").await, Err(StoreError::Io(_))));
        assert!(matches!(store.reorder(0, 2).await, Err(StoreError::Io(_))));
        assert_eq!(queries(&store).await, vec!["A", "B", "C"]);
        assert!(store.snapshot("B").await.is_some());

        memory.fail_saves(false);
        store.remove("B").await.unwrap();
        assert_eq!(queries(&store).await, vec!["A", "C"]);
        assert!(memory.stored_weather().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_gps_and_snapshot_writes_keep_previous_state() {
        let (store, memory) = store();
        memory.fail_saves(true);

        let set = store
            .set_gps_entry(Some(LocationEntry::manual("47.6,-122.3")))
            .await;
        assert!(matches!(set, Err(StoreError::Io(_))));
        assert!(store.gps_entry().await.is_none());

        let cached = store.set_snapshot("A", snap("A")).await;
        assert!(matches!(cached, Err(StoreError::Io(_))));
        assert!(store.snapshot("A").await.is_none());
    }
}
