//! Stash demo binary.

use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use stash_cache::QueryClient;
use stash_demo::{Cli, Resources, StashSettings, run, telemetry};

const GC_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cli = Cli::parse();
    let mut settings =
        StashSettings::load(cli.config.as_deref()).context("failed to load settings")?;
    if cli.offline {
        settings.offline = true;
    }

    let metrics = if cli.metrics {
        Some(telemetry::init_metrics()?)
    } else {
        None
    };

    tracing::info!("Starting Stash demo v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        offline = settings.offline,
        stale_time = ?settings.cache.stale_time,
        retry = settings.cache.retry,
        "Settings loaded"
    );

    let client = QueryClient::new(settings.cache.clone());
    let _gc = client.start_gc(GC_PERIOD);
    let resources = Resources::from_settings(&settings)?;

    let mut stdout = io::stdout();
    run(&client, &resources, cli.cmd, &mut stdout).await?;

    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }

    Ok(())
}
