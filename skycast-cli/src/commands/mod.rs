//! CLI command implementations.

pub mod config;
pub mod locations;
pub mod refresh;
pub mod search;
pub mod watch;

use anyhow::{Context, Result};
use skycast_fetch::FetchContext;
use skycast_providers::ProviderRegistry;
use skycast_refresh::{FixedLocator, Locator, Orchestrator, SettingsPolicy, UnavailableLocator};
use skycast_store::{JsonFilePersistence, LocationStore, SettingsStore};
use std::sync::Arc;

use crate::listener::CollectingListener;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Everything a command needs, wired against the on-disk stores.
pub struct Session {
    pub orchestrator: Orchestrator,
    pub policy: SettingsPolicy,
    pub listener: Arc<CollectingListener>,
}

impl Session {
    /// Loads the location store and wires the orchestrator and settings
    /// policy around it.
    pub async fn open(cli: &Cli, settings: SettingsStore) -> Result<Self> {
        let persistence = Arc::new(JsonFilePersistence::default_dirs());
        let locations = LocationStore::load(persistence)
            .await
            .context("Failed to load saved locations")?;
        let ctx = FetchContext::new()?;
        let registry = ProviderRegistry::global().clone();

        let locator: Arc<dyn Locator> = match cli.position {
            Some(position) => Arc::new(FixedLocator::new(position)),
            None => Arc::new(UnavailableLocator),
        };
        let listener = Arc::new(CollectingListener::new());

        let orchestrator = Orchestrator::new(
            settings.clone(),
            locations.clone(),
            registry.clone(),
            ctx.clone(),
        )
        .with_locator(locator.clone())
        .with_listener(listener.clone());
        let policy = SettingsPolicy::new(settings, locations, registry, ctx, locator);

        Ok(Self {
            orchestrator,
            policy,
            listener,
        })
    }
}

/// Prints a value in the selected format, using `text` for text output.
pub fn emit<T: serde::Serialize>(
    cli: &Cli,
    value: &T,
    text: impl FnOnce(&TextFormatter) -> String,
) -> Result<()> {
    let output = match cli.format {
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(value)?,
        OutputFormat::Text => text(&TextFormatter::new(!cli.no_color)),
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
