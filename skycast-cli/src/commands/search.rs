//! Search command - location autocomplete through the active provider.

use anyhow::Result;
use clap::Args;
use skycast_refresh::SearchOutcome;
use skycast_store::SettingsStore;

use super::{emit, Session};
use crate::{Cli, ExitCode};

/// Arguments for search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Place to search for.
    pub text: String,
}

/// Runs the search command.
pub async fn run(args: &SearchArgs, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    let session = Session::open(cli, settings).await?;
    let suggestions = match session.orchestrator.search(&args.text).await? {
        SearchOutcome::Applied(s) => s,
        SearchOutcome::Stale | SearchOutcome::Cleared => Vec::new(),
    };
    emit(cli, &suggestions, |f| f.format_suggestions(&suggestions))?;
    Ok(ExitCode::Success)
}
