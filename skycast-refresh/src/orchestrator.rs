//! Weather refresh orchestration.
//!
//! The orchestrator owns the displayed panels (one optional GPS panel plus
//! one per saved location), decides between a full reload and a quiet
//! refresh, and loads weather per location through the active provider.
//!
//! ## Panel lifecycle
//!
//! ```text
//! Idle -> Fetching -> Loaded
//!                  -> Failed -> Fetching ...
//! ```

use futures::future::join_all;
use skycast_core::{
    ClassifiedError, LocationEntry, LocationSuggestion, WeatherErrorKind, WeatherListener,
    WeatherSnapshot, WeatherSource,
};
use skycast_fetch::{FetchContext, WeatherProvider};
use skycast_providers::ProviderRegistry;
use skycast_store::{LocationEvent, LocationStore, Settings, SettingsStore};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::RefreshError;
use crate::error_tally::ErrorTally;
use crate::gps::{AccessStatus, Locator, UnavailableLocator, MAX_POSITION_AGE, POSITION_TIMEOUT};
use crate::search::{LocationSearch, SearchOutcome};

/// Navigation parameter asking for a refresh only.
pub const TOAST_REFRESH: &str = "toast-refresh";

// ============================================================================
// View Types
// ============================================================================

/// Load state of one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is running.
    Fetching,
    /// Weather is on display.
    Loaded,
    /// The last fetch failed; earlier data, if any, stays on display.
    Failed,
}

/// One displayed location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPanel {
    /// The location shown.
    pub entry: LocationEntry,
    /// Provider of the snapshot on display.
    pub source: Option<WeatherSource>,
    /// Load state.
    pub state: PanelState,
    /// Weather on display.
    pub snapshot: Option<WeatherSnapshot>,
}

impl LocationPanel {
    fn new(entry: LocationEntry, snapshot: Option<WeatherSnapshot>) -> Self {
        Self {
            entry,
            source: snapshot.as_ref().map(|s| s.source),
            state: PanelState::Idle,
            snapshot,
        }
    }

    fn show(&mut self, snapshot: WeatherSnapshot) {
        self.source = Some(snapshot.source);
        self.snapshot = Some(snapshot);
        self.state = PanelState::Loaded;
    }
}

#[derive(Debug, Default)]
struct PanelView {
    gps: Option<LocationPanel>,
    manual: Vec<LocationPanel>,
    edit_mode: bool,
}

impl PanelView {
    fn panel_mut(&mut self, query: &str) -> Option<&mut LocationPanel> {
        self.gps
            .iter_mut()
            .chain(self.manual.iter_mut())
            .find(|p| p.entry.query == query)
    }

    fn entries(&self) -> Vec<LocationEntry> {
        self.gps
            .iter()
            .chain(self.manual.iter())
            .map(|p| p.entry.clone())
            .collect()
    }
}

/// Why a full reload was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// Saved and displayed manual location counts differ.
    LocationCountChanged,
    /// GPS following was switched since the panels were built.
    GpsToggled,
    /// A panel shows weather from a provider other than the active one.
    ProviderChanged,
    /// The device moved to a different GPS location.
    GpsLocationChanged,
    /// The location list was navigated to and needs building.
    Navigation,
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Panels were rebuilt from the store.
    FullReload(ReloadReason),
    /// Weather was reloaded for the existing panels.
    Quiet,
}

/// Result of loading weather for one location.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A fresh cached snapshot was used.
    Cached(WeatherSnapshot),
    /// The provider returned a new snapshot.
    Fetched(WeatherSnapshot),
    /// The provider call failed.
    Failed(ClassifiedError),
    /// A load for this query was already running.
    Skipped,
}

impl LoadOutcome {
    /// Returns the snapshot now on display, if any.
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            LoadOutcome::Cached(s) | LoadOutcome::Fetched(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if the provider was called successfully.
    pub fn is_fetched(&self) -> bool {
        matches!(self, LoadOutcome::Fetched(_))
    }
}

/// How the location list was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// First visit.
    New,
    /// Returning from another page.
    Back,
    /// Forward navigation.
    Forward,
    /// Reload of the same page.
    Refresh,
}

// ============================================================================
// In-flight Guard
// ============================================================================

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a query as being fetched until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    query: String,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, query: &str) -> Option<Self> {
        if !lock(set).insert(query.to_string()) {
            return None;
        }
        Some(Self {
            set,
            query: query.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.query);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives location and weather refreshes for the location list.
pub struct Orchestrator {
    settings: SettingsStore,
    locations: LocationStore,
    registry: ProviderRegistry,
    ctx: FetchContext,
    locator: Arc<dyn Locator>,
    listener: Arc<dyn WeatherListener>,
    view: RwLock<PanelView>,
    in_flight: Mutex<HashSet<String>>,
    tally: Mutex<ErrorTally>,
    search: LocationSearch,
}

impl Orchestrator {
    /// Creates an orchestrator with no location service and no listener.
    pub fn new(
        settings: SettingsStore,
        locations: LocationStore,
        registry: ProviderRegistry,
        ctx: FetchContext,
    ) -> Self {
        Self {
            settings,
            locations,
            registry,
            ctx,
            locator: Arc::new(UnavailableLocator),
            listener: Arc::new(skycast_core::NoopListener),
            view: RwLock::new(PanelView::default()),
            in_flight: Mutex::new(HashSet::new()),
            tally: Mutex::new(ErrorTally::new()),
            search: LocationSearch::new(),
        }
    }

    /// Sets the device position source.
    #[must_use]
    pub fn with_locator(mut self, locator: Arc<dyn Locator>) -> Self {
        self.locator = locator;
        self
    }

    /// Sets the UI listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn WeatherListener>) -> Self {
        self.listener = listener;
        self
    }

    /// The settings store.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The location store.
    pub fn locations(&self) -> &LocationStore {
        &self.locations
    }

    /// The displayed panels, GPS first.
    pub async fn panels(&self) -> Vec<LocationPanel> {
        let view = self.view.read().await;
        view.gps.iter().chain(view.manual.iter()).cloned().collect()
    }

    /// The GPS panel.
    pub async fn gps_panel(&self) -> Option<LocationPanel> {
        self.view.read().await.gps.clone()
    }

    fn provider(&self, source: WeatherSource) -> Result<Arc<dyn WeatherProvider>, RefreshError> {
        self.registry
            .get(source)
            .ok_or(RefreshError::ProviderUnavailable(source))
    }

    /// Delivers an error to the listener unless its kind was already shown.
    fn report(&self, error: &ClassifiedError) {
        if lock(&self.tally).should_surface(error.kind) {
            warn!(kind = ?error.kind, query = ?error.query, "{}", error.message);
            self.listener.on_weather_error(error);
        }
    }

    // ========================================================================
    // Reload Policy
    // ========================================================================

    /// Decides whether the displayed panels must be rebuilt.
    async fn reload_reason(&self, settings: &Settings) -> Option<ReloadReason> {
        let saved_count = self.locations.len().await;
        let last_gps = self.locations.gps_entry().await;
        let view = self.view.read().await;

        if saved_count != view.manual.len() {
            return Some(ReloadReason::LocationCountChanged);
        }
        if settings.follow_gps != view.gps.is_some() {
            return Some(ReloadReason::GpsToggled);
        }
        let stale_provider = view
            .gps
            .iter()
            .chain(view.manual.iter())
            .filter_map(|p| p.source)
            .any(|source| source != settings.api);
        if stale_provider {
            return Some(ReloadReason::ProviderChanged);
        }
        if let Some(panel) = view.gps.as_ref() {
            if last_gps.as_ref().map(|e| e.query.as_str()) != Some(panel.entry.query.as_str()) {
                return Some(ReloadReason::GpsLocationChanged);
            }
        }
        None
    }

    /// Refreshes the location list, rebuilding it when stale.
    ///
    /// With a GPS panel on display the device position is looked up first,
    /// so a move to a new GPS location triggers a full reload.
    ///
    /// # Errors
    ///
    /// Store failures during a full reload.
    #[instrument(skip(self))]
    pub async fn refresh_locations(&self) -> Result<RefreshKind, RefreshError> {
        let follow_gps = self.settings.get().await.follow_gps;
        if follow_gps && self.view.read().await.gps.is_some() {
            self.update_location().await?;
        }

        let settings = self.settings.get().await;
        if let Some(reason) = self.reload_reason(&settings).await {
            info!(?reason, "Reloading locations");
            self.load_locations().await?;
            return Ok(RefreshKind::FullReload(reason));
        }

        let entries = self.view.read().await.entries();
        debug!(count = entries.len(), "Quiet refresh");
        join_all(entries.iter().map(|e| self.load_weather_data(e, false))).await;
        Ok(RefreshKind::Quiet)
    }

    /// Rebuilds every panel from the store and loads weather for each.
    ///
    /// # Errors
    ///
    /// Store failures from the GPS sub-flow.
    #[instrument(skip(self))]
    pub async fn load_locations(&self) -> Result<Vec<LoadOutcome>, RefreshError> {
        {
            let mut view = self.view.write().await;
            view.gps = None;
            view.manual.clear();
        }

        let settings = self.settings.get().await;
        let gps = if settings.follow_gps {
            match self.locations.gps_entry().await {
                Some(entry) => Some(entry),
                None => self.update_location().await?,
            }
        } else {
            None
        };
        // The GPS sub-flow may have switched following off.
        let settings = self.settings.get().await;

        let gps_panel = match gps {
            Some(entry) if settings.follow_gps => {
                let cached = self.displayable(&entry.query, &settings).await;
                Some(LocationPanel::new(entry, cached))
            }
            _ => None,
        };
        let mut manual = Vec::new();
        for entry in self.locations.entries().await {
            let cached = self.displayable(&entry.query, &settings).await;
            manual.push(LocationPanel::new(entry, cached));
        }

        let entries = {
            let mut view = self.view.write().await;
            view.gps = gps_panel;
            view.manual = manual;
            view.entries()
        };
        info!(panels = entries.len(), "Panels rebuilt");

        let outcomes = join_all(entries.iter().map(|e| self.load_weather_data(e, false))).await;
        if outcomes.iter().any(|o| o.snapshot().is_some()) {
            self.settings.set_weather_loaded(true).await?;
        }
        Ok(outcomes)
    }

    /// Cached snapshot for `query` if it came from the active provider and
    /// unit.
    async fn displayable(&self, query: &str, settings: &Settings) -> Option<WeatherSnapshot> {
        self.locations
            .snapshot(query)
            .await
            .filter(|s| s.matches(settings.api, settings.unit))
    }

    // ========================================================================
    // Weather
    // ========================================================================

    /// Loads weather for one location, using the cache when fresh.
    ///
    /// A snapshot is fresh when it exists for the query, is younger than
    /// the refresh interval, and was produced by the active provider in
    /// the active unit.
    #[instrument(skip(self, location), fields(query = %location.query))]
    pub async fn load_weather_data(&self, location: &LocationEntry, force_refresh: bool) -> LoadOutcome {
        let settings = self.settings.get().await;
        let query = location.query.as_str();

        if !force_refresh {
            if let Some(cached) = self.fresh_snapshot(query, &settings).await {
                debug!("Using cached snapshot");
                if let Some(panel) = self.view.write().await.panel_mut(query) {
                    panel.show(cached.clone());
                }
                self.listener.on_weather_loaded(location, &cached);
                return LoadOutcome::Cached(cached);
            }
        }

        let Some(_guard) = InFlight::acquire(&self.in_flight, query) else {
            debug!("Load already in flight");
            return LoadOutcome::Skipped;
        };
        if let Some(panel) = self.view.write().await.panel_mut(query) {
            panel.state = PanelState::Fetching;
        }

        let result = match self.provider(settings.api) {
            Ok(provider) => provider
                .fetch_weather(&self.ctx, query, settings.unit, &settings.api_key)
                .await
                .map_err(RefreshError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(snapshot) => {
                if let Err(e) = self.locations.set_snapshot(query, snapshot.clone()).await {
                    warn!(error = %e, "Failed to cache snapshot");
                }
                if let Some(panel) = self.view.write().await.panel_mut(query) {
                    panel.show(snapshot.clone());
                }
                info!(provider = ?snapshot.source, temp = snapshot.temperature, "Weather loaded");
                self.listener.on_weather_loaded(location, &snapshot);
                LoadOutcome::Fetched(snapshot)
            }
            Err(e) => {
                let error = e.classify().for_query(query);
                if let Some(panel) = self.view.write().await.panel_mut(query) {
                    panel.state = PanelState::Failed;
                }
                self.report(&error);
                LoadOutcome::Failed(error)
            }
        }
    }

    async fn fresh_snapshot(&self, query: &str, settings: &Settings) -> Option<WeatherSnapshot> {
        self.displayable(query, settings)
            .await
            .filter(|s| s.is_fresh(settings.refresh_interval.as_duration()))
    }

    // ========================================================================
    // GPS
    // ========================================================================

    /// Looks up the device position and commits it as the GPS location.
    ///
    /// Returns the committed entry, or `None` when no GPS location could
    /// be determined this cycle. Denied access switches GPS following off
    /// and clears the GPS slot.
    ///
    /// # Errors
    ///
    /// Store failures while clearing or saving the GPS slot.
    #[instrument(skip(self))]
    pub async fn update_location(&self) -> Result<Option<LocationEntry>, RefreshError> {
        let position = match self.locator.position(MAX_POSITION_AGE, POSITION_TIMEOUT).await {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "No position, requesting access");
                match self.locator.request_access().await {
                    AccessStatus::Allowed => {
                        match self.locator.position(MAX_POSITION_AGE, POSITION_TIMEOUT).await {
                            Ok(p) => p,
                            Err(e) => {
                                warn!(error = %e, "Position unavailable after access granted");
                                self.clear_gps_panel().await;
                                return Ok(None);
                            }
                        }
                    }
                    AccessStatus::Denied => {
                        info!("Location access denied, disabling GPS");
                        self.settings.set_follow_gps(false).await?;
                        self.clear_gps_panel().await;
                        self.locations.set_gps_entry(None).await?;
                        self.report(&RefreshError::PermissionDenied.classify());
                        return Ok(None);
                    }
                    AccessStatus::Unspecified => {
                        self.clear_gps_panel().await;
                        return Ok(None);
                    }
                }
            }
        };

        let settings = self.settings.get().await;
        let resolved = match self.provider(settings.api) {
            Ok(provider) => provider
                .resolve_position(&self.ctx, position, &settings.api_key)
                .await
                .map_err(RefreshError::from),
            Err(e) => Err(e),
        };
        let query = match resolved {
            Ok(Some(q)) if !q.trim().is_empty() => q,
            Ok(_) => {
                debug!(%position, "No location for position");
                self.clear_gps_panel().await;
                self.report(&ClassifiedError::new(
                    WeatherErrorKind::GeocodeEmpty,
                    format!("No location found at {position}"),
                ));
                return Ok(None);
            }
            Err(e) => {
                self.report(&e.classify());
                return Ok(None);
            }
        };

        let mut entry = LocationEntry::gps(query, position);
        if let Some(previous) = self.locations.gps_entry().await {
            if previous.query == entry.query {
                entry.name = previous.name;
                entry.weather_source = previous.weather_source;
            }
        }
        if let Err(e) = self.locations.set_gps_entry(Some(entry.clone())).await {
            let e = RefreshError::from(e);
            if e.kind() == WeatherErrorKind::DuplicateLocation {
                self.report(&e.classify().for_query(entry.query.clone()));
                return Ok(None);
            }
            return Err(e);
        }
        info!(query = %entry.query, "GPS location updated");
        Ok(Some(entry))
    }

    async fn clear_gps_panel(&self) {
        self.view.write().await.gps = None;
    }

    // ========================================================================
    // Location List Edits
    // ========================================================================

    /// Saves a chosen suggestion as a new location.
    ///
    /// A fresh cached snapshot is reused; otherwise weather is fetched
    /// first and a location that cannot be fetched is not added.
    ///
    /// # Errors
    ///
    /// `EmptyQuery`, `DuplicateLocation`, or the fetch failure.
    #[instrument(skip(self, suggestion), fields(query = %suggestion.query))]
    pub async fn add_location(
        &self,
        suggestion: &LocationSuggestion,
    ) -> Result<LocationEntry, RefreshError> {
        if !suggestion.has_query() {
            return Err(RefreshError::EmptyQuery);
        }
        let query = suggestion.query.trim();
        if self.locations.contains(query).await {
            let err = RefreshError::DuplicateLocation(query.to_string());
            self.report(&err.classify().for_query(query));
            return Err(err);
        }

        let settings = self.settings.get().await;
        let snapshot = match self.fresh_snapshot(query, &settings).await {
            Some(cached) => cached,
            None => {
                let provider = self.provider(settings.api)?;
                match provider
                    .fetch_weather(&self.ctx, query, settings.unit, &settings.api_key)
                    .await
                {
                    Ok(s) => s,
                    Err(e) => {
                        let err = RefreshError::from(e);
                        self.report(&err.classify().for_query(query));
                        return Err(err);
                    }
                }
            }
        };

        let mut entry = suggestion.to_entry();
        entry.query = query.to_string();
        let entry = match self.locations.add(entry).await {
            Ok(e) => e,
            Err(e) => {
                let err = RefreshError::from(e);
                self.report(&err.classify().for_query(query));
                return Err(err);
            }
        };
        if let Err(e) = self.locations.set_snapshot(query, snapshot.clone()).await {
            warn!(query, error = %e, "Weather for new location not cached");
        }
        let entry = self.locations.get(query).await.unwrap_or(entry);

        {
            let mut panel = LocationPanel::new(entry.clone(), None);
            panel.show(snapshot.clone());
            self.view.write().await.manual.push(panel);
        }
        info!(name = %entry.display_name(), "Location added");
        self.listener.on_weather_loaded(&entry, &snapshot);
        Ok(entry)
    }

    /// Removes a saved location and its panel.
    ///
    /// Edit mode is switched off when reordering no longer applies.
    ///
    /// # Errors
    ///
    /// `LocationNotFound` or persistence failures.
    pub async fn remove_location(&self, query: &str) -> Result<LocationEntry, RefreshError> {
        let mut events = self.locations.subscribe();
        let removed = self.locations.remove(query).await?;
        self.view.write().await.manual.retain(|p| p.entry.query != query);
        while let Ok(event) = events.try_recv() {
            self.handle_event(&event).await;
        }
        Ok(removed)
    }

    /// Moves a saved location and its panel.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` or persistence failures.
    pub async fn move_location(&self, from: usize, to: usize) -> Result<(), RefreshError> {
        self.locations.reorder(from, to).await?;
        let saved = self.locations.entries().await;
        let settings = self.settings.get().await;

        let mut view = self.view.write().await;
        let in_step = view.manual.len() == saved.len()
            && view
                .manual
                .iter()
                .all(|p| saved.iter().any(|e| e.query == p.entry.query));
        if !in_step {
            warn!(
                panels = view.manual.len(),
                saved = saved.len(),
                "Panels out of step with saved locations, realigning"
            );
        }

        // Panels follow the saved order; entries without one get a panel
        // from the cache.
        let mut panels = std::mem::take(&mut view.manual);
        for entry in saved {
            match panels.iter().position(|p| p.entry.query == entry.query) {
                Some(i) => view.manual.push(panels.swap_remove(i)),
                None => {
                    let cached = self.displayable(&entry.query, &settings).await;
                    view.manual.push(LocationPanel::new(entry, cached));
                }
            }
        }
        Ok(())
    }

    /// Reacts to a location store event.
    pub async fn handle_event(&self, event: &LocationEvent) {
        if matches!(event, LocationEvent::ReorderUnavailable) {
            self.set_edit_mode(false).await;
        }
    }

    /// Enters or leaves reorder mode.
    pub async fn set_edit_mode(&self, enabled: bool) {
        let mut view = self.view.write().await;
        if view.edit_mode != enabled {
            debug!(enabled, "Edit mode changed");
            view.edit_mode = enabled;
        }
    }

    /// Returns true in reorder mode.
    pub async fn edit_mode(&self) -> bool {
        self.view.read().await.edit_mode
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Handles one keystroke of location search through the active
    /// provider.
    ///
    /// # Errors
    ///
    /// The provider's failure when the request is still current.
    pub async fn search(&self, text: &str) -> Result<SearchOutcome, RefreshError> {
        let settings = self.settings.get().await;
        let provider = self.provider(settings.api)?;
        let ctx = &self.ctx;
        let key = settings.api_key.as_str();
        let outcome = self
            .search
            .run(text, move |text| async move {
                provider.search_locations(ctx, &text, key).await
            })
            .await?;
        Ok(outcome)
    }

    /// The current search suggestions.
    pub fn suggestions(&self) -> Vec<LocationSuggestion> {
        self.search.suggestions()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Called when the location list becomes active.
    ///
    /// # Errors
    ///
    /// Store failures during a reload.
    #[instrument(skip(self))]
    pub async fn on_navigated_to(
        &self,
        mode: NavigationMode,
        parameter: Option<&str>,
    ) -> Result<RefreshKind, RefreshError> {
        lock(&self.tally).reset();

        if parameter == Some(TOAST_REFRESH) {
            return self.refresh_locations().await;
        }

        let settings = self.settings.get().await;
        if !settings.follow_gps {
            self.clear_gps_panel().await;
        }

        let (has_manual, has_gps) = {
            let view = self.view.read().await;
            (!view.manual.is_empty(), view.gps.is_some())
        };
        let rebuild = (!settings.follow_gps && !has_manual)
            || (settings.follow_gps && !has_gps)
            || mode == NavigationMode::New;
        if rebuild {
            self.load_locations().await?;
            Ok(RefreshKind::FullReload(ReloadReason::Navigation))
        } else {
            self.refresh_locations().await
        }
    }

    /// Called when the location list is left.
    pub async fn on_navigating_from(&self) {
        self.set_edit_mode(false).await;
        lock(&self.tally).reset();
    }

    /// Called when the application resumes.
    ///
    /// # Errors
    ///
    /// Store failures during a reload.
    pub async fn on_resuming(&self) -> Result<RefreshKind, RefreshError> {
        self.refresh_locations().await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
