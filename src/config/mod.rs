// src/config/mod.rs
//! Service configuration with layered loading

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::utils::time::sample_period_millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction-time configuration of the acquisition service
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Live polling rate in Hz
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Logical history length reported to consumers; the service always keeps
    /// the last [`buffer::MAX_RETAINED_READINGS`]
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "defaults::websocket_url")]
    pub websocket_url: String,

    #[serde(default = "defaults::http_endpoint")]
    pub http_endpoint: String,

    /// Sent as a bearer token with every request to `http_endpoint`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_api_key: Option<String>,

    /// Placeholder for multi-device setups, not used by acquisition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default = "defaults::connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "defaults::simulation_interval_ms")]
    pub simulation_interval_ms: u64,

    /// Serial device probed for availability; empty disables the probe
    #[serde(default = "defaults::serial_port")]
    pub serial_port: String,
}

/// Partial update applied by `set_connection_config`
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigPatch {
    pub sample_rate_hz: Option<u32>,
    pub websocket_url: Option<String>,
    pub http_endpoint: Option<String>,
    pub http_api_key: Option<String>,
    pub device_id: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub simulation_interval_ms: Option<u64>,
    pub serial_port: Option<String>,
}

mod defaults {
    use crate::config::constants::*;

    pub fn sample_rate_hz() -> u32 { hal::DEFAULT_SAMPLE_RATE_HZ }
    pub fn buffer_size() -> usize { buffer::DEFAULT_BUFFER_SIZE }
    pub fn websocket_url() -> String { hal::DEFAULT_WEBSOCKET_URL.to_string() }
    pub fn http_endpoint() -> String { hal::DEFAULT_HTTP_ENDPOINT.to_string() }
    pub fn connect_timeout_ms() -> u64 { hal::DEFAULT_CONNECTION_TIMEOUT_MS }
    pub fn simulation_interval_ms() -> u64 { simulation::DEFAULT_TICK_INTERVAL_MS }
    pub fn serial_port() -> String { hal::DEFAULT_SERIAL_PORT.to_string() }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::sample_rate_hz(),
            buffer_size: defaults::buffer_size(),
            websocket_url: defaults::websocket_url(),
            http_endpoint: defaults::http_endpoint(),
            http_api_key: None,
            device_id: None,
            connect_timeout_ms: defaults::connect_timeout_ms(),
            simulation_interval_ms: defaults::simulation_interval_ms(),
            serial_port: defaults::serial_port(),
        }
    }
}

impl ServiceConfig {
    /// Check value ranges and URL schemes
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.sample_rate_hz == 0 || self.sample_rate_hz > hal::MAX_SAMPLE_RATE_HZ {
            errors.push(format!(
                "sample_rate_hz must be between 1 and {}, got {}",
                hal::MAX_SAMPLE_RATE_HZ,
                self.sample_rate_hz
            ));
        }
        if self.buffer_size == 0 {
            errors.push("buffer_size must be greater than 0".to_string());
        }
        if self.connect_timeout_ms == 0 {
            errors.push("connect_timeout_ms must be greater than 0".to_string());
        }
        if self.simulation_interval_ms == 0 {
            errors.push("simulation_interval_ms must be greater than 0".to_string());
        }
        if !(self.websocket_url.starts_with("ws://") || self.websocket_url.starts_with("wss://")) {
            errors.push(format!(
                "websocket_url must use ws:// or wss://, got `{}`",
                self.websocket_url
            ));
        }
        if !(self.http_endpoint.starts_with("http://") || self.http_endpoint.starts_with("https://")) {
            errors.push(format!(
                "http_endpoint must use http:// or https://, got `{}`",
                self.http_endpoint
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Merge a partial update into this configuration
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(rate) = patch.sample_rate_hz {
            self.sample_rate_hz = rate;
        }
        if let Some(url) = patch.websocket_url {
            self.websocket_url = url;
        }
        if let Some(endpoint) = patch.http_endpoint {
            self.http_endpoint = endpoint;
        }
        if patch.http_api_key.is_some() {
            self.http_api_key = patch.http_api_key;
        }
        if patch.device_id.is_some() {
            self.device_id = patch.device_id;
        }
        if let Some(timeout) = patch.connect_timeout_ms {
            self.connect_timeout_ms = timeout;
        }
        if let Some(interval) = patch.simulation_interval_ms {
            self.simulation_interval_ms = interval;
        }
        if let Some(port) = patch.serial_port {
            self.serial_port = port;
        }
    }

    /// Number of readings actually kept in history, independent of `buffer_size`
    pub fn retained_readings(&self) -> usize {
        buffer::MAX_RETAINED_READINGS
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(sample_period_millis(self.sample_rate_hz))
    }

    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms.max(1))
    }
}
