//! `emotibit-bridge`: serve an EmotiBit CSV export over HTTP and WebSocket.
//!
//! # Usage
//!
//! ```bash
//! emotibit-bridge --bind 0.0.0.0:8080 --csv emotibit_live.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use emotibit_core::bridge::{serve, BridgeConfig, BridgeState};
use emotibit_core::config::constants::paths::{DEFAULT_BRIDGE_BIND, DEFAULT_CSV_FILE};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the bridge.
#[derive(Parser, Debug)]
#[command(name = "emotibit-bridge", version, about = "Serve an EmotiBit CSV export as a live source")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BRIDGE_BIND)]
    bind: SocketAddr,

    /// CSV file to tail; a sample file is created if missing
    #[arg(long, default_value = DEFAULT_CSV_FILE)]
    csv: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!(csv = %args.csv.display(), "EmotiBit bridge v{}", emotibit_core::VERSION);

    let state = BridgeState::new(BridgeConfig {
        csv_path: args.csv,
        ..Default::default()
    });
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    tokio::select! {
        result = serve(listener, state) => result.context("bridge server failed")?,
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }
    Ok(())
}
