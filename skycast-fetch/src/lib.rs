// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Skycast Fetch
//!
//! HTTP plumbing and the provider abstraction for Skycast.
//!
//! - [`client::HttpClient`] - reqwest client with retry and key redaction
//! - [`retry::RetryStrategy`] - Backoff policy
//! - [`context::FetchContext`] - Shared client plus request settings
//! - [`provider::WeatherProvider`] - Trait implemented by each weather service
//! - [`error::FetchError`] - Errors and their mapping onto user-facing kinds
//!
//! ## Example
//!
//! ```ignore
//! use skycast_fetch::{FetchContext, WeatherProvider};
//!
//! let ctx = FetchContext::new()?;
//! let snapshot = provider
//!     .fetch_weather(&ctx, "Seattle,WA", TemperatureUnit::Fahrenheit, &api_key)
//!     .await?;
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod provider;
pub mod retry;

pub use client::HttpClient;
pub use context::{FetchContext, FetchContextBuilder, RequestPolicy};
pub use error::FetchError;
pub use provider::WeatherProvider;
pub use retry::RetryStrategy;
