// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Skycast Providers
//!
//! Concrete weather providers for Skycast.
//!
//! Each provider module includes:
//!
//! - **api**: Endpoint and URL construction
//! - **parser**: Response parsing into core types
//! - **error**: Provider-specific errors and their [`skycast_fetch::FetchError`] mapping
//!
//! ## Supported Providers
//!
//! | Provider | API key | Query format |
//! |----------|---------|--------------|
//! | Weather Underground | Required | `City,ST` or `/q/zmw:...` |
//! | Yahoo Weather | No | Place text or `lat,lon` |
//!
//! ## Usage
//!
//! ```ignore
//! use skycast_providers::ProviderRegistry;
//! use skycast_core::WeatherSource;
//!
//! let provider = ProviderRegistry::global().get(WeatherSource::Yahoo).unwrap();
//! let snapshot = provider.fetch_weather(&ctx, "Paris, France", unit, "").await?;
//! ```

pub mod lenient;
pub mod registry;

pub mod wunderground;
pub mod yahoo;

pub use registry::ProviderRegistry;
pub use wunderground::{WUndergroundProvider, WuEndpoints, WuError};
pub use yahoo::{YahooError, YahooProvider, YqlEndpoint};
