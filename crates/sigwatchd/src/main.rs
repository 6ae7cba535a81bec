//! Signal hub daemon - entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sigwatch_hub::{run_poller, Hub};
use sigwatch_server::run_server;
use sigwatch_store::SqliteStore;

/// Live traffic-signal broadcast hub.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SIGWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    sigwatch_telemetry::init_logging()?;

    info!("Starting sigwatchd v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > SIGWATCH_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("SIGWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = sigwatchd::AppConfig::load(&config_path)?;
    info!(
        db_path = %config.db_path,
        port = config.server.port,
        poll_interval_ms = config.poller.poll_interval_ms,
        "Configuration loaded"
    );

    let store = SqliteStore::open(&config.db_path)?;
    store.init_schema().await?;

    let hub = Arc::new(Hub::new());
    tokio::spawn(run_poller(
        Arc::clone(&hub),
        store.clone(),
        config.poller.interval(),
    ));

    run_server(hub, store, config.server).await?;

    Ok(())
}
