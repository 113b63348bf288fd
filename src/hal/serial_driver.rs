// src/hal/serial_driver.rs
//! Serial transport tier and line protocol
//!
//! The acquisition sequence only probes for the device: opening a serial port
//! needs an explicit user action, so a present device is reported and the
//! tier still returns unavailable. Lines read from a port the user opened are
//! fed through [`parse_serial_line`] by `BiometricService::ingest_serial_line`.

use crate::config::constants::hal::DEFAULT_SERIAL_BAUD_RATE;
use crate::config::ServiceConfig;
use crate::error::EmotiBitError;
use crate::hal::{AcquisitionStrategy, ConnectOutcome, RawFields, SharedSink, TransportKind};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// Availability probe for a serial-attached EmotiBit
#[derive(Debug, Clone)]
pub struct SerialProbeStrategy {
    port: PathBuf,
    baud_rate: u32,
}

impl SerialProbeStrategy {
    pub fn new(port: impl Into<PathBuf>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_SERIAL_BAUD_RATE,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.serial_port)
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn unavailable(&self, reason: impl Into<String>) -> ConnectOutcome {
        ConnectOutcome::Unavailable(EmotiBitError::TransportSetup {
            transport: TransportKind::Serial,
            reason: reason.into(),
        })
    }
}

#[async_trait]
impl AcquisitionStrategy for SerialProbeStrategy {
    fn transport(&self) -> TransportKind {
        TransportKind::Serial
    }

    async fn try_connect(&self, _sink: SharedSink) -> ConnectOutcome {
        if self.port.as_os_str().is_empty() {
            return self.unavailable("no serial port configured");
        }

        let present = tokio::fs::try_exists(&self.port).await.unwrap_or(false);
        if present {
            info!(
                port = %self.port.display(),
                baud_rate = self.baud_rate,
                "Serial device available; connecting requires explicit opt-in"
            );
            self.unavailable(format!("{} present, explicit opt-in required", self.port.display()))
        } else {
            debug!(port = %self.port.display(), "No serial device found");
            self.unavailable(format!("{} not found", self.port.display()))
        }
    }
}

/// Parse one `KEY:VALUE,KEY:VALUE` line, e.g. `HR:75,HRV:45,EDA:0.3,TEMP:34.5`.
///
/// Unknown keys and unparsable values are skipped. Returns `None` when the
/// line holds no recognised pair.
pub fn parse_serial_line(line: &str) -> Option<RawFields> {
    let mut fields = RawFields::default();

    for pair in line.trim().split(',') {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }

        match key.trim() {
            "HR" | "hr" => fields.heart_rate = Some(value),
            "HRV" | "hrv" => fields.hrv = Some(value),
            "EDA" | "eda" => fields.eda = Some(value),
            "TEMP" | "temp" => fields.temperature = Some(value),
            _ => {}
        }
    }

    (!fields.is_empty()).then_some(fields)
}
