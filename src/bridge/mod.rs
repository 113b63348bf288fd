// src/bridge/mod.rs
//! Bridge server exposing an EmotiBit CSV export as a live source
//!
//! The EmotiBit Oscilloscope writes recordings to CSV. The bridge tails the
//! file and serves its last row over the same HTTP and WebSocket endpoints
//! the acquisition service polls, so a desktop recording can drive the
//! service as if it were a streaming device.

pub mod csv_source;
pub mod server;

pub use csv_source::{CsvRow, CsvSource};
pub use server::{router, run_monitor, serve, BridgeConfig, BridgeState};

use crate::hal::BiometricReading;
use crate::processing::stress::round_to;
use crate::processing::StressModel;
use crate::config::constants::signal::*;
use serde::{Deserialize, Serialize};

/// Where a bridge payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    Csv,
    Simulated,
    ErrorFallback,
}

/// Body served by `/api/emotibit` and pushed on `/emotibit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgePayload {
    pub hr: u32,
    pub hrv: u32,
    pub eda: f64,
    pub temp: f64,
    pub score: f64,
    pub timestamp: u64,
    pub source: PayloadSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgePayload {
    /// Build from one CSV row; integer fields are truncated, not rounded
    pub fn from_row(row: &CsvRow, timestamp: u64) -> Self {
        let eda = row.eda.unwrap_or(BASELINE_EDA_US);
        let hr = row.heart_rate.unwrap_or(BASELINE_HEART_RATE_BPM);
        let hrv = row.hrv.unwrap_or(BASELINE_HRV_MS);
        let temp = row.temperature.unwrap_or(BASELINE_TEMP_C);

        Self {
            hr: hr.trunc().max(0.0) as u32,
            hrv: hrv.trunc().max(0.0) as u32,
            eda: round_to(eda, 2),
            temp: round_to(temp, 1),
            score: StressModel::Weighted.score(hr, hrv, eda),
            timestamp,
            source: PayloadSource::Csv,
            error: None,
        }
    }

    pub fn from_simulated(reading: &BiometricReading) -> Self {
        Self {
            hr: reading.heart_rate(),
            hrv: reading.hrv(),
            eda: reading.eda(),
            temp: reading.temperature(),
            score: StressModel::Weighted.score(
                reading.heart_rate() as f64,
                reading.hrv() as f64,
                reading.eda(),
            ),
            timestamp: reading.timestamp(),
            source: PayloadSource::Simulated,
            error: None,
        }
    }

    /// Fixed body returned with HTTP 500
    pub fn error_fallback(error: impl Into<String>, timestamp: u64) -> Self {
        Self {
            hr: BASELINE_HEART_RATE_BPM as u32,
            hrv: BASELINE_HRV_MS as u32,
            eda: BASELINE_EDA_US,
            temp: BASELINE_TEMP_C,
            score: 5.0,
            timestamp,
            source: PayloadSource::ErrorFallback,
            error: Some(error.into()),
        }
    }

    pub fn to_row(&self) -> CsvRow {
        CsvRow {
            eda: Some(self.eda),
            heart_rate: Some(self.hr as f64),
            hrv: Some(self.hrv as f64),
            temperature: Some(self.temp),
        }
    }
}
