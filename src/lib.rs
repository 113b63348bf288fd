//! EmotiBit Core: biometric acquisition for stress-aware applications
//!
//! This library connects to an EmotiBit wearable over the first transport
//! that answers and keeps a bounded history of readings. It features:
//!
//! - Ordered acquisition: WebSocket, then HTTP polling, then a serial probe
//! - Procedural simulation whenever no live transport is available
//! - Tolerant payload extraction across firmware field names
//! - A deterministic stress score and game recommendations
//! - An optional bridge server that turns a CSV export into a live source
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emotibit_core::{BiometricService, GameRecommendation, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = BiometricService::connect(ServiceConfig::default()).await;
//!
//!     let reading = service.get_reading(true);
//!     let game = GameRecommendation::for_score(reading.score());
//!     println!("stress {} -> {}", reading.score(), game.name());
//!
//!     service.disconnect();
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod hal;
pub mod processing;
pub mod utils;

#[cfg(feature = "bridge")]
pub mod bridge;

// Re-export commonly used types for convenience
pub use acquisition::{BiometricService, ServiceBuilder};
pub use config::{ConfigLoader, ConfigPatch, ServiceConfig};
pub use error::{EmotiBitError, EmotiBitResult};
pub use hal::{
    AcquisitionStrategy, BiometricReading, BiometricSimulator, ConnectOutcome, ConnectionStatus,
    TransportKind,
};
pub use processing::{GameRecommendation, PayloadProcessor, StressLevel, StressModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec![
        "WebSocket and HTTP acquisition".to_string(),
        "Procedural simulation fallback".to_string(),
        "Stress scoring".to_string(),
    ];
    if cfg!(feature = "bridge") {
        features.push("CSV bridge server".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Biometric acquisition and simulation service for EmotiBit sensors".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
