//! Watch command - refresh on the configured interval.

use anyhow::Result;
use clap::Args;
use skycast_refresh::NavigationMode;
use skycast_store::SettingsStore;
use std::io::{stdout, Write};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use super::refresh::{exit_code, print};
use super::Session;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between refresh checks. Weather is still only re-fetched
    /// once the configured refresh interval has passed.
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Minimum interval to use.
    #[arg(long, default_value = "10")]
    pub min_interval: u64,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli, settings: SettingsStore) -> Result<ExitCode> {
    let configured = u64::from(settings.get().await.refresh_interval.minutes()) * 60;
    let period = args.interval.unwrap_or(configured).max(args.min_interval);

    info!(interval = period, "Starting watch mode");

    let session = Session::open(cli, settings).await?;
    let mut ticker = interval(Duration::from_secs(period));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // First tick completes immediately.
    ticker.tick().await;
    let mut kind = session
        .orchestrator
        .on_navigated_to(NavigationMode::New, None)
        .await?;

    loop {
        if cli.format == OutputFormat::Text {
            print!("\x1b[2J\x1b[H");
            stdout().flush()?;

            let now = chrono::Local::now();
            println!(
                "Skycast Watch Mode - {} (check every {}s)",
                now.format("%H:%M:%S"),
                period
            );
            println!("{}", "─".repeat(50));
            println!();
        }

        print(cli, &session, kind).await?;

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                let panels = session.orchestrator.panels().await;
                session.orchestrator.on_navigating_from().await;
                return Ok(exit_code(&panels));
            }
        }

        kind = session.orchestrator.on_resuming().await?;
    }
}
