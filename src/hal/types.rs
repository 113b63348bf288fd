// src/hal/types.rs
//! Core types shared by the transport tiers and the service

use crate::processing::stress::stress_score;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One biometric sample.
///
/// The stress score is derived from heart rate, HRV and EDA and cannot be set
/// directly; every constructor and `with_*` method recomputes it. Inbound
/// `score` fields are ignored on deserialization for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReadingWire")]
pub struct BiometricReading {
    #[serde(rename = "hr")]
    heart_rate: u32,
    hrv: u32,
    eda: f64,
    #[serde(rename = "temp")]
    temperature: f64,
    score: f64,
    timestamp: u64,
}

#[derive(Deserialize)]
struct ReadingWire {
    hr: u32,
    hrv: u32,
    eda: f64,
    temp: f64,
    timestamp: u64,
}

impl From<ReadingWire> for BiometricReading {
    fn from(wire: ReadingWire) -> Self {
        BiometricReading::new(wire.hr, wire.hrv, wire.eda, wire.temp, wire.timestamp)
    }
}

impl BiometricReading {
    pub fn new(heart_rate: u32, hrv: u32, eda: f64, temperature: f64, timestamp: u64) -> Self {
        Self {
            heart_rate,
            hrv,
            eda,
            temperature,
            score: stress_score(heart_rate, hrv, eda),
            timestamp,
        }
    }

    /// Heart rate in beats per minute
    pub fn heart_rate(&self) -> u32 {
        self.heart_rate
    }

    /// Heart-rate variability in milliseconds
    pub fn hrv(&self) -> u32 {
        self.hrv
    }

    /// Electrodermal activity in microsiemens
    pub fn eda(&self) -> f64 {
        self.eda
    }

    /// Skin temperature in degrees Celsius
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Derived stress score, 0.0 to 10.0
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Capture time, milliseconds since the Unix epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn with_heart_rate(self, heart_rate: u32) -> Self {
        Self::new(heart_rate, self.hrv, self.eda, self.temperature, self.timestamp)
    }

    pub fn with_hrv(self, hrv: u32) -> Self {
        Self::new(self.heart_rate, hrv, self.eda, self.temperature, self.timestamp)
    }

    pub fn with_eda(self, eda: f64) -> Self {
        Self::new(self.heart_rate, self.hrv, eda, self.temperature, self.timestamp)
    }

    pub fn with_temperature(self, temperature: f64) -> Self {
        Self::new(self.heart_rate, self.hrv, self.eda, temperature, self.timestamp)
    }
}

/// Live transport tiers, in acquisition priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    #[serde(rename = "WebSocket")]
    WebSocket,
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "Serial")]
    Serial,
}

impl TransportKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "WebSocket",
            TransportKind::Http => "HTTP",
            TransportKind::Serial => "Serial",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the service connection state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub simulating: bool,
    pub transport: Option<TransportKind>,
    pub last_update: Option<u64>,
}

impl ConnectionStatus {
    /// Transport label for display, `None` while simulating or idle
    pub fn transport_label(&self) -> Option<&'static str> {
        self.transport.as_ref().map(TransportKind::label)
    }
}

/// Raw field values pulled out of a live payload before defaults are applied
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawFields {
    pub heart_rate: Option<f64>,
    pub hrv: Option<f64>,
    pub eda: Option<f64>,
    pub temperature: Option<f64>,
}

impl RawFields {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.hrv.is_none()
            && self.eda.is_none()
            && self.temperature.is_none()
    }
}
