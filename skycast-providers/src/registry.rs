//! Provider registry.
//!
//! Maps a [`WeatherSource`] onto the provider that serves it. The default
//! registry is built lazily once per process; tests build their own with
//! scripted providers.

use skycast_core::WeatherSource;
use skycast_fetch::WeatherProvider;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;

use crate::wunderground::WUndergroundProvider;
use crate::yahoo::YahooProvider;

// ============================================================================
// Static Registry
// ============================================================================

/// Lazily-built registry of the public providers.
static DEFAULT_REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

fn init_default() -> ProviderRegistry {
    let mut registry = ProviderRegistry::empty();
    match WUndergroundProvider::new() {
        Ok(p) => registry.register(Arc::new(p)),
        Err(e) => warn!(error = %e, "Weather Underground provider unavailable"),
    }
    match YahooProvider::new() {
        Ok(p) => registry.register(Arc::new(p)),
        Err(e) => warn!(error = %e, "Yahoo provider unavailable"),
    }
    registry
}

// ============================================================================
// Provider Registry
// ============================================================================

/// A set of providers keyed by source.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<WeatherSource, Arc<dyn WeatherProvider>>,
}

impl ProviderRegistry {
    /// Returns the shared registry of public providers.
    pub fn global() -> &'static ProviderRegistry {
        DEFAULT_REGISTRY.get_or_init(init_default)
    }

    /// Creates a registry with no providers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds or replaces the provider for its source.
    pub fn register(&mut self, provider: Arc<dyn WeatherProvider>) {
        self.providers.insert(provider.source(), provider);
    }

    /// Builder-style [`ProviderRegistry::register`].
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Gets the provider for a source.
    pub fn get(&self, source: WeatherSource) -> Option<Arc<dyn WeatherProvider>> {
        self.providers.get(&source).cloned()
    }

    /// Returns the registered sources in declaration order.
    pub fn sources(&self) -> Vec<WeatherSource> {
        WeatherSource::all()
            .iter()
            .copied()
            .filter(|s| self.providers.contains_key(s))
            .collect()
    }

    /// Returns the number of registered providers.
    pub fn count(&self) -> usize {
        self.providers.len()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
