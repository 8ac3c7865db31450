// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Skycast Store
//!
//! State for the Skycast application.
//!
//! This crate provides:
//!
//! - **LocationStore**: Saved locations, the GPS slot and the weather cache,
//!   with broadcast change events
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: The storage seam, with JSON-file and in-memory backends
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use skycast_store::{JsonFilePersistence, LocationStore, SettingsStore};
//! use skycast_core::LocationEntry;
//!
//! let settings = SettingsStore::load_default().await?;
//! let locations = LocationStore::load(Arc::new(JsonFilePersistence::default_dirs())).await?;
//!
//! let mut events = locations.subscribe();
//! locations.add(LocationEntry::manual("Seattle, WA")).await?;
//! println!("{:?}", events.recv().await?);
//! ```

pub mod backend;
pub mod error;
pub mod location_store;
pub mod persistence;
pub mod settings_store;

pub use backend::{JsonFilePersistence, MemoryPersistence, Persistence, WeatherCache};
pub use error::StoreError;
pub use location_store::{LocationEvent, LocationStore};
pub use persistence::{
    default_cache_dir, default_config_dir, default_settings_path, default_weather_path, load_json,
    load_json_or_default, save_json,
};
pub use settings_store::{LogLevel, Settings, SettingsStore};

#[cfg(test)]
mod persistence_tests;
