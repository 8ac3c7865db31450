//! Settings-page policy.
//!
//! Rules for switching providers, verifying API keys and toggling GPS
//! following, on top of [`SettingsStore`].

use skycast_core::{RefreshInterval, TemperatureUnit, WeatherSource};
use skycast_fetch::FetchContext;
use skycast_providers::ProviderRegistry;
use skycast_store::{LocationStore, SettingsStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::RefreshError;
use crate::gps::{AccessStatus, Locator};

/// Settings operations with their side effects.
pub struct SettingsPolicy {
    settings: SettingsStore,
    locations: LocationStore,
    registry: ProviderRegistry,
    ctx: FetchContext,
    locator: Arc<dyn Locator>,
}

impl SettingsPolicy {
    /// Creates the policy over the shared stores.
    pub fn new(
        settings: SettingsStore,
        locations: LocationStore,
        registry: ProviderRegistry,
        ctx: FetchContext,
        locator: Arc<dyn Locator>,
    ) -> Self {
        Self {
            settings,
            locations,
            registry,
            ctx,
            locator,
        }
    }

    /// Selects the active provider.
    ///
    /// Providers without keys switch immediately and clear key
    /// verification. A key-requiring provider switches only when a key is
    /// already stored; the stored key then counts as verified. Returns
    /// whether the provider switched.
    ///
    /// # Errors
    ///
    /// Persistence failures.
    pub async fn select_provider(&self, source: WeatherSource) -> Result<bool, RefreshError> {
        if !source.requires_api_key() {
            self.settings.set_api(source).await?;
            self.settings.set_api_key_verified(false).await?;
            info!(provider = ?source, "Provider selected");
            return Ok(true);
        }

        let settings = self.settings.get().await;
        if !settings.has_api_key() {
            info!(provider = ?source, "Provider needs an API key first");
            return Ok(false);
        }
        self.settings.set_api_key_verified(true).await?;
        self.settings.set_api(source).await?;
        info!(provider = ?source, "Provider selected");
        Ok(true)
    }

    /// Verifies and stores a Weather Underground key, making it the active
    /// provider.
    ///
    /// # Errors
    ///
    /// `InvalidKey` when the provider rejects the key; nothing changes.
    #[instrument(skip(self, key))]
    pub async fn submit_api_key(&self, key: &str) -> Result<(), RefreshError> {
        let source = WeatherSource::WUnderground;
        let provider = self
            .registry
            .get(source)
            .ok_or(RefreshError::ProviderUnavailable(source))?;

        let key = key.trim();
        if key.is_empty() || !provider.validate_key(&self.ctx, key).await? {
            warn!("API key rejected");
            return Err(RefreshError::InvalidKey);
        }

        self.settings.set_api_key(key, true).await?;
        self.settings.set_api(source).await?;
        info!("API key verified");
        Ok(())
    }

    /// Checks whether the settings page may be left.
    ///
    /// # Errors
    ///
    /// `MissingApiKey` when the selected provider needs a key and none is
    /// set.
    pub async fn can_leave(&self) -> Result<(), RefreshError> {
        let settings = self.settings.get().await;
        if settings.missing_api_key() {
            return Err(RefreshError::MissingApiKey(settings.api));
        }
        Ok(())
    }

    /// Turns GPS following on or off.
    ///
    /// Turning it on asks for location access; turning it off clears the
    /// GPS slot.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when access is refused or undecided; following
    /// stays off.
    pub async fn set_follow_gps(&self, enabled: bool) -> Result<(), RefreshError> {
        if !enabled {
            self.settings.set_follow_gps(false).await?;
            self.locations.set_gps_entry(None).await?;
            info!("GPS following disabled");
            return Ok(());
        }

        match self.locator.request_access().await {
            AccessStatus::Allowed => {
                self.settings.set_follow_gps(true).await?;
                info!("GPS following enabled");
                Ok(())
            }
            status => {
                warn!(?status, "Location access not granted");
                self.settings.set_follow_gps(false).await?;
                Err(RefreshError::PermissionDenied)
            }
        }
    }

    /// Sets the temperature unit.
    ///
    /// # Errors
    ///
    /// Persistence failures.
    pub async fn set_unit(&self, unit: TemperatureUnit) -> Result<(), RefreshError> {
        Ok(self.settings.set_unit(unit).await?)
    }

    /// Sets the refresh interval.
    ///
    /// # Errors
    ///
    /// Persistence failures.
    pub async fn set_refresh_interval(&self, interval: RefreshInterval) -> Result<(), RefreshError> {
        Ok(self.settings.set_refresh_interval(interval).await?)
    }
}

impl std::fmt::Debug for SettingsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsPolicy").finish_non_exhaustive()
    }
}
