//! Refresh command - load weather for every location.

use anyhow::Result;
use clap::Args;
use skycast_refresh::{LoadOutcome, LocationPanel, NavigationMode, RefreshKind, ReloadReason};
use skycast_store::SettingsStore;
use tracing::{debug, info};

use super::{emit, Session};
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode};

/// Arguments for refresh command.
#[derive(Args, Default)]
pub struct RefreshArgs {
    /// Fetch every location even when its cached weather is fresh.
    #[arg(long)]
    pub force: bool,
}

/// Runs the refresh command.
pub async fn run(args: &RefreshArgs, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    if settings.get().await.missing_api_key() {
        if !cli.quiet {
            eprintln!(
                "{} needs an API key. Set one with `skycast config key <KEY>` or switch with `skycast config provider yahoo`.",
                settings.get().await.api
            );
        }
        return Ok(ExitCode::MissingKey);
    }

    let session = Session::open(cli, settings).await?;
    let kind = load(&session, args.force).await?;
    print(cli, &session, kind).await
}

/// Builds the panels, then re-fetches cached ones when forced.
pub async fn load(session: &Session, force: bool) -> Result<RefreshKind> {
    let orchestrator = &session.orchestrator;
    if !force {
        return Ok(orchestrator.on_navigated_to(NavigationMode::New, None).await?);
    }

    let outcomes = orchestrator.load_locations().await?;
    let panels = orchestrator.panels().await;
    for (panel, outcome) in panels.iter().zip(outcomes.iter()) {
        if matches!(outcome, LoadOutcome::Cached(_)) {
            debug!(query = %panel.entry.query, "Forcing fetch over cache");
            orchestrator.load_weather_data(&panel.entry, true).await;
        }
    }
    info!(panels = panels.len(), "Forced refresh complete");
    Ok(RefreshKind::FullReload(ReloadReason::Navigation))
}

/// Prints panels and errors, returning the exit code for the result.
pub async fn print(cli: &Cli, session: &Session, kind: RefreshKind) -> Result<ExitCode> {
    let panels = session.orchestrator.panels().await;
    let errors = session.listener.take_errors();
    let now = chrono::Utc::now();

    emit(cli, &JsonFormatter::refresh_output(kind, &panels, &errors), |f| {
        f.format_refresh(&panels, &errors, now)
    })?;
    Ok(exit_code(&panels))
}

/// `NoWeather` when there are panels and none has weather to show.
pub fn exit_code(panels: &[LocationPanel]) -> ExitCode {
    if !panels.is_empty() && panels.iter().all(|p| p.snapshot.is_none()) {
        ExitCode::NoWeather
    } else {
        ExitCode::Success
    }
}
