//! `emotibit-monitor`: connect to an EmotiBit and log readings periodically.
//!
//! # Usage
//!
//! ```bash
//! emotibit-monitor --config emotibit.toml
//! emotibit-monitor --websocket-url ws://192.168.1.20:8080/emotibit --poll-secs 2
//! emotibit-monitor --simulate-only
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use emotibit_core::config::constants::consumer::DEFAULT_POLL_INTERVAL_SECS;
use emotibit_core::{
    BiometricService, ConfigLoader, ConfigPatch, GameRecommendation, StressLevel,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the monitor.
#[derive(Parser, Debug)]
#[command(name = "emotibit-monitor", version, about = "Log EmotiBit readings and stress scores")]
struct Args {
    /// TOML configuration file; defaults to emotibit.toml and config/emotibit.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the WebSocket URL
    #[arg(long, value_name = "URL")]
    websocket_url: Option<String>,

    /// Override the HTTP endpoint
    #[arg(long, value_name = "URL")]
    http_endpoint: Option<String>,

    /// Seconds between logged readings
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_secs: u64,

    /// Skip all live transports
    #[arg(long, default_value_t = false)]
    simulate_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut loader = match &args.config {
        Some(path) => ConfigLoader::with_paths(vec![path.clone()]),
        None => ConfigLoader::new(),
    };
    let mut config = loader
        .load_service_config()
        .context("failed to load service configuration")?;
    config.apply(ConfigPatch {
        websocket_url: args.websocket_url,
        http_endpoint: args.http_endpoint,
        ..Default::default()
    });
    config.validate().context("invalid command-line override")?;

    info!("EmotiBit monitor v{}", emotibit_core::VERSION);

    let mut builder = BiometricService::builder(config);
    if args.simulate_only {
        builder = builder.strategies(Vec::new());
    }
    let service = builder.connect().await;

    let status = service.get_connection_status();
    info!(
        connected = status.connected,
        simulating = status.simulating,
        transport = status.transport_label().unwrap_or("none"),
        "Acquisition settled"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.poll_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reading = service.get_reading(true);
                let level = StressLevel::from_score(reading.score());
                let game = GameRecommendation::for_score(reading.score());
                info!(
                    hr = reading.heart_rate(),
                    hrv = reading.hrv(),
                    eda = reading.eda(),
                    temp = reading.temperature(),
                    score = reading.score(),
                    level = level.label(),
                    game = game.id(),
                    live = service.is_device_connected(),
                    "Reading"
                );
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    service.disconnect();
    Ok(())
}
