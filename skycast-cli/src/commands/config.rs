//! Config command - manage configuration.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use skycast_core::{RefreshInterval, TemperatureUnit, WeatherSource};
use skycast_store::{default_cache_dir, default_config_dir, JsonFilePersistence, SettingsStore};
use tracing::info;

use super::{emit, Session};
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration and cache paths.
    Path,

    /// Select the weather provider.
    Provider {
        /// wunderground or yahoo.
        #[arg(value_parser = parse_source)]
        provider: WeatherSource,
    },

    /// Verify and store a Weather Underground API key.
    Key {
        /// The API key.
        key: String,
    },

    /// Set the temperature unit.
    Unit {
        /// F or C.
        #[arg(value_parser = parse_unit)]
        unit: TemperatureUnit,
    },

    /// Set how long cached weather stays fresh.
    Interval {
        /// Minutes: 15, 30, 60, 180 or 360.
        #[arg(value_parser = parse_interval)]
        minutes: RefreshInterval,
    },

    /// Turn GPS following on or off.
    Gps {
        /// on or off.
        #[arg(value_parser = parse_switch)]
        state: bool,
    },

    /// Reset to defaults.
    Reset,
}

fn parse_source(s: &str) -> Result<WeatherSource, String> {
    s.parse().map_err(|e: skycast_core::CoreError| e.to_string())
}

fn parse_unit(s: &str) -> Result<TemperatureUnit, String> {
    s.parse().map_err(|e: skycast_core::CoreError| e.to_string())
}

fn parse_interval(s: &str) -> Result<RefreshInterval, String> {
    let minutes: u32 = s.trim().parse().map_err(|_| format!("not a number: {s}"))?;
    RefreshInterval::try_from(minutes).map_err(|e| e.to_string())
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {other}")),
    }
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli, &settings).await?,
        ConfigAction::Path => show_paths(cli, &settings)?,
        ConfigAction::Reset => reset_config(cli, &settings).await?,
        action => return update(action, cli, settings).await,
    }
    Ok(ExitCode::Success)
}

async fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;
    emit(cli, &JsonFormatter::settings_output(&settings), |f| {
        format!(
            "Skycast Configuration\n{}\n\n{}",
            "─".repeat(40),
            f.format_settings(&settings)
        )
    })
}

fn show_paths(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let cache_dir = default_cache_dir();
    let settings_path = store
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let files = JsonFilePersistence::default_dirs();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:     {}", config_dir.display());
            println!("Cache dir:      {}", cache_dir.display());
            println!("Settings file:  {settings_path}");
            println!("Locations file: {}", files.locations_path().display());
            println!("Weather cache:  {}", files.weather_path().display());
            println!("GPS location:   {}", files.gps_path().display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "cache_dir": cache_dir.display().to_string(),
                "settings_file": settings_path,
                "locations_file": files.locations_path().display().to_string(),
                "weather_file": files.weather_path().display().to_string(),
                "gps_file": files.gps_path().display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn update(action: &ConfigAction, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    let session = Session::open(cli, settings.clone()).await?;
    let policy = &session.policy;

    let message = match action {
        ConfigAction::Provider { provider } => {
            if policy.select_provider(*provider).await? {
                info!(provider = ?provider, "Provider selected");
                format!("Provider set to {provider}")
            } else {
                if !cli.quiet {
                    eprintln!(
                        "{provider} needs an API key. Run `skycast config key <KEY>` to verify one."
                    );
                }
                return Ok(ExitCode::MissingKey);
            }
        }
        ConfigAction::Key { key } => match policy.submit_api_key(key).await {
            Ok(()) => format!("API key verified; provider set to {}", WeatherSource::WUnderground),
            Err(e) => bail!("{e}"),
        },
        ConfigAction::Unit { unit } => {
            policy.set_unit(*unit).await?;
            format!("Unit set to {unit}")
        }
        ConfigAction::Interval { minutes } => {
            policy.set_refresh_interval(*minutes).await?;
            format!("Weather refreshes every {minutes}")
        }
        ConfigAction::Gps { state } => {
            policy.set_follow_gps(*state).await?;
            format!("GPS following {}", if *state { "on" } else { "off" })
        }
        ConfigAction::Show | ConfigAction::Path | ConfigAction::Reset => String::new(),
    };

    if !cli.quiet && !message.is_empty() {
        eprintln!("{message}");
    }
    show_config(cli, &settings).await?;
    Ok(ExitCode::Success)
}

async fn reset_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    store.reset().await?;
    if let Some(path) = store.path() {
        info!(path = %path.display(), "Settings reset");
    }
    if !cli.quiet {
        println!("Configuration reset to defaults");
    }
    Ok(())
}
