//! Giftpool node — entry point.
//!
//! Starts the Giftpool API node with configuration from a TOML file or
//! defaults.

// Public APIs for node internals — used by tests and external consumers.
#![allow(dead_code)]

mod api;
mod config;
mod state;
mod storage;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::GiftpoolConfig;
use state::AppState;
use storage::Storage;

/// Giftpool Node
#[derive(Parser, Debug)]
#[command(name = "giftpool-node", version, about = "Giftpool API node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "giftpool.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Handle --init flag
    if args.init {
        let config = GiftpoolConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = GiftpoolConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    config.logging.level = args.log_level;

    tracing::info!("Giftpool Node v{}", env!("CARGO_PKG_VERSION"));

    let storage = Arc::new(Storage::open(&config.storage.data_dir)?);
    let listen_addr: SocketAddr =
        format!("{}:{}", config.api.listen_addr, config.api.port).parse()?;

    let state = Arc::new(AppState::new(config, storage)?);

    api::start_api_server(listen_addr, state).await?;
    tracing::info!("Giftpool node exited cleanly");
    Ok(())
}
