// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Skycast Refresh
//!
//! Decides when cached location and weather state is stale and reloads it.
//!
//! - **Orchestrator**: reload policy, per-location loads, GPS sub-flow,
//!   location list edits and navigation hooks
//! - **SettingsPolicy**: provider selection, API key checks, GPS toggling
//! - **LocationSearch**: keystroke search where the newest request wins
//! - **ErrorTally**: each error kind reaches the UI once per session
//!
//! ## Usage
//!
//! ```ignore
//! use skycast_refresh::{NavigationMode, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(settings, locations, registry, ctx)
//!     .with_listener(listener);
//!
//! orchestrator.on_navigated_to(NavigationMode::New, None).await?;
//! for panel in orchestrator.panels().await {
//!     println!("{}: {:?}", panel.entry.display_name(), panel.state);
//! }
//! ```

pub mod error;
pub mod error_tally;
pub mod gps;
pub mod orchestrator;
pub mod search;
pub mod settings;

pub use error::RefreshError;
pub use error_tally::ErrorTally;
pub use gps::{
    AccessStatus, FixedLocator, Locator, LocatorError, UnavailableLocator, MAX_POSITION_AGE,
    POSITION_TIMEOUT,
};
pub use orchestrator::{
    LoadOutcome, LocationPanel, NavigationMode, Orchestrator, PanelState, RefreshKind,
    ReloadReason, TOAST_REFRESH,
};
pub use search::{LocationSearch, SearchOutcome};
pub use settings::SettingsPolicy;
