// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Skycast CLI - saved-location weather from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Weather for every saved location
//! skycast
//!
//! # Add a location from search results
//! skycast locations add "Seattle"
//!
//! # Track the device position
//! skycast --position 47.61,-122.33 config gps on
//!
//! # Re-fetch everything, ignoring the cache
//! skycast refresh --force
//!
//! # JSON output
//! skycast --format json --pretty
//!
//! # Watch mode
//! skycast watch
//! ```

mod commands;
mod listener;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use skycast_core::GeoPosition;
use skycast_store::{LogLevel, SettingsStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, locations, refresh, search, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Skycast CLI - weather for your saved locations.
#[derive(Parser)]
#[command(name = "skycast")]
#[command(about = "Saved-location weather with cached refresh")]
#[command(long_about = r#"
Skycast shows current conditions and a short forecast for a list of saved
locations, plus the device location when GPS following is on. Weather is
cached and only re-fetched once the refresh interval has passed.

Supported providers:
  • Weather Underground (wunderground, API key required)
  • Yahoo Weather (yahoo)

Examples:
  skycast                          # Weather for all locations
  skycast locations add Paris      # Add the first match for "Paris"
  skycast refresh --force          # Ignore the cache
  skycast config provider yahoo    # Switch providers
  skycast --format json            # JSON output
"#)]
#[command(version)]
#[command(author = "Skycast Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'refresh' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Device position as "lat,lon". Without it location access is
    /// unavailable.
    #[arg(long, global = true, value_parser = parse_position)]
    pub position: Option<GeoPosition>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Load weather for every location (default if no command specified).
    #[command(visible_alias = "r")]
    Refresh(refresh::RefreshArgs),

    /// Manage saved locations.
    #[command(visible_alias = "l")]
    Locations(locations::LocationsArgs),

    /// Search for locations with the active provider.
    #[command(visible_alias = "s")]
    Search(search::SearchArgs),

    /// Refresh on the configured interval.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No location could be loaded.
    NoWeather = 2,
    /// The active provider needs an API key.
    MissingKey = 3,
}

fn parse_position(s: &str) -> Result<GeoPosition, String> {
    GeoPosition::parse(s).map_err(|e| e.to_string())
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("skycast=debug,info")
    } else {
        EnvFilter::new(format!("skycast={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = SettingsStore::load_default().await?;
    setup_logging(cli.verbose, cli.quiet, settings.get().await.log_level);

    let result = match &cli.command {
        Some(Commands::Refresh(args)) => refresh::run(args, &cli, settings).await,
        Some(Commands::Locations(args)) => locations::run(args, &cli, settings).await,
        Some(Commands::Search(args)) => search::run(args, &cli, settings).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli, settings).await,
        Some(Commands::Config(args)) => config::run(args, &cli, settings).await,
        None => refresh::run(&refresh::RefreshArgs::default(), &cli, settings).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
