//! Locations command - list and edit saved locations.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use skycast_core::LocationSuggestion;
use skycast_refresh::SearchOutcome;
use skycast_store::SettingsStore;

use super::{emit, Session};
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode};

/// Arguments for locations command.
#[derive(Args)]
pub struct LocationsArgs {
    #[command(subcommand)]
    pub action: Option<LocationsAction>,
}

/// Location list actions.
#[derive(Subcommand)]
pub enum LocationsAction {
    /// List saved locations (default).
    List,

    /// Add a location from search results.
    Add {
        /// Place to search for.
        text: String,

        /// Which search result to add.
        #[arg(long, default_value = "0")]
        pick: usize,

        /// Use the text as the provider query without searching.
        #[arg(long)]
        exact: bool,
    },

    /// Remove a saved location by query or index.
    Remove {
        /// Query or list index.
        location: String,
    },

    /// Move a saved location to another position.
    Move {
        /// Current index.
        from: usize,
        /// New index.
        to: usize,
    },
}

/// Runs the locations command.
pub async fn run(args: &LocationsArgs, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    let session = Session::open(cli, settings).await?;

    match args.action.as_ref().unwrap_or(&LocationsAction::List) {
        LocationsAction::List => {}
        LocationsAction::Add { text, pick, exact } => {
            let suggestion = if *exact {
                LocationSuggestion::new(text.trim(), text.trim())
            } else {
                choose(&session, text, *pick).await?
            };
            let entry = match session.orchestrator.add_location(&suggestion).await {
                Ok(entry) => entry,
                Err(e) => bail!("Could not add {}: {e}", suggestion.name),
            };
            if !cli.quiet {
                eprintln!("Added {}", entry.display_name());
            }
        }
        LocationsAction::Remove { location } => {
            let query = resolve_query(&session, location).await?;
            let removed = session.orchestrator.remove_location(&query).await?;
            if !cli.quiet {
                eprintln!("Removed {}", removed.display_name());
            }
        }
        LocationsAction::Move { from, to } => {
            session.orchestrator.move_location(*from, *to).await?;
        }
    }

    list(cli, &session).await?;
    Ok(ExitCode::Success)
}

async fn list(cli: &Cli, session: &Session) -> Result<()> {
    let store = session.orchestrator.locations();
    let gps = store.gps_entry().await;
    let entries = store.entries().await;
    emit(
        cli,
        &JsonFormatter::locations_output(gps.as_ref(), &entries),
        |f| f.format_locations(gps.as_ref(), &entries),
    )
}

/// Searches with the active provider and picks one suggestion.
async fn choose(session: &Session, text: &str, pick: usize) -> Result<LocationSuggestion> {
    let suggestions = match session.orchestrator.search(text).await? {
        SearchOutcome::Applied(s) => s,
        SearchOutcome::Stale | SearchOutcome::Cleared => Vec::new(),
    };
    match suggestions.get(pick) {
        Some(s) if s.has_query() => Ok(s.clone()),
        Some(_) => bail!("Result {pick} for \"{text}\" has no usable location"),
        None if suggestions.is_empty() => bail!("No locations match \"{text}\""),
        None => bail!(
            "Only {} results for \"{text}\"; pick 0 to {}",
            suggestions.len(),
            suggestions.len() - 1
        ),
    }
}

/// Accepts a saved query or a list index.
async fn resolve_query(session: &Session, location: &str) -> Result<String> {
    let store = session.orchestrator.locations();
    if store.contains(location).await {
        return Ok(location.to_string());
    }
    if let Ok(index) = location.parse::<usize>() {
        if let Some(entry) = store.entries().await.get(index) {
            return Ok(entry.query.clone());
        }
    }
    bail!("No saved location \"{location}\"")
}
