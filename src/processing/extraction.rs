// src/processing/extraction.rs
//! Tolerant field extraction from live EmotiBit payloads
//!
//! Firmware builds and bridges disagree on field names, so each logical
//! field has an ordered list of candidate keys. The first key holding a
//! finite number wins; a missing field is filled from the resting generator.

use crate::config::constants::hal::*;
use crate::error::{EmotiBitError, EmotiBitResult};
use crate::hal::simulator::{
    simulated_eda, simulated_heart_rate, simulated_hrv, simulated_temperature, SignalDrivers,
};
use crate::hal::{BiometricReading, RawFields};
use crate::processing::stress::round_to;
use serde_json::{Map, Value};
use tracing::debug;

pub const HEART_RATE_KEYS: &[&str] = &["hr", "heartRate", "BPM"];
pub const HRV_KEYS: &[&str] = &["hrv", "HRV", "rmssd"];
pub const EDA_KEYS: &[&str] = &["eda", "EDA", "gsr", "skinConductance"];
pub const TEMPERATURE_KEYS: &[&str] = &["temp", "temperature", "skinTemp"];

pub const ECG_KEY: &str = "ecg";
pub const RR_INTERVALS_KEY: &str = "rrIntervals";

/// Turns one decoded live payload into raw field values
pub trait PayloadProcessor: Send + Sync {
    fn process(&self, payload: &Value) -> EmotiBitResult<RawFields>;
}

/// Default processor: candidate key lookup with ECG/RR derivations
#[derive(Debug, Default, Clone, Copy)]
pub struct TolerantExtractor;

impl PayloadProcessor for TolerantExtractor {
    fn process(&self, payload: &Value) -> EmotiBitResult<RawFields> {
        let object = payload
            .as_object()
            .ok_or_else(|| EmotiBitError::payload(format!("expected JSON object, got {}", kind_of(payload))))?;

        Ok(RawFields {
            heart_rate: first_numeric(object, HEART_RATE_KEYS)
                .or_else(|| numeric_array(object, ECG_KEY).and_then(|ecg| heart_rate_from_ecg(&ecg))),
            hrv: first_numeric(object, HRV_KEYS).or_else(|| {
                numeric_array(object, RR_INTERVALS_KEY).and_then(|rr| hrv_from_rr_intervals(&rr))
            }),
            eda: first_numeric(object, EDA_KEYS),
            temperature: first_numeric(object, TEMPERATURE_KEYS),
        })
    }
}

impl<F> PayloadProcessor for F
where
    F: Fn(&Value) -> EmotiBitResult<RawFields> + Send + Sync,
{
    fn process(&self, payload: &Value) -> EmotiBitResult<RawFields> {
        self(payload)
    }
}

/// First candidate key holding a finite number
pub fn first_numeric(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_f64)
        .find(|value| value.is_finite())
}

fn numeric_array(object: &Map<String, Value>, key: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = object
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(Value::as_f64)
        .collect();
    Some(values)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fill missing fields from the resting generators and round to reading precision.
///
/// Live values are not clamped to physiological ranges; only the fallbacks
/// are range-bound. Integer fields saturate at the `u32` bounds.
pub fn assemble_reading(raw: RawFields, timestamp: u64) -> BiometricReading {
    let resting = SignalDrivers::RESTING;
    let heart_rate = raw
        .heart_rate
        .map(|hr| to_count("heart_rate", hr))
        .unwrap_or_else(|| simulated_heart_rate(resting));
    let hrv = raw
        .hrv
        .map(|hrv| to_count("hrv", hrv))
        .unwrap_or_else(|| simulated_hrv(resting));
    let eda = raw
        .eda
        .map(|eda| round_to(eda, 2))
        .unwrap_or_else(|| simulated_eda(resting));
    let temperature = raw
        .temperature
        .map(|temp| round_to(temp, 1))
        .unwrap_or_else(|| simulated_temperature(resting));

    BiometricReading::new(heart_rate, hrv, eda, temperature, timestamp)
}

/// Round to a whole count; `as` saturates negatives to 0 and overflow to `u32::MAX`
fn to_count(field: &'static str, value: f64) -> u32 {
    let rounded = value.round();
    if rounded < 0.0 || rounded > u32::MAX as f64 {
        debug!(field, value, "Live value outside u32 range, saturating");
    }
    rounded as u32
}

/// Heart rate from raw ECG samples via simple peak detection.
///
/// Returns `None` when there are too few samples or fewer than two peaks.
pub fn heart_rate_from_ecg(ecg: &[f64]) -> Option<f64> {
    if ecg.len() < ECG_MIN_SAMPLES {
        return None;
    }

    let max = ecg.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = max * ECG_PEAK_THRESHOLD_RATIO;

    let peaks: Vec<usize> = (1..ecg.len() - 1)
        .filter(|&i| ecg[i] > threshold && ecg[i] > ecg[i - 1] && ecg[i] > ecg[i + 1])
        .collect();
    if peaks.len() < 2 {
        return None;
    }

    let intervals: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let heart_rate = 60.0 * ECG_SAMPLE_RATE_HZ / mean_interval;

    Some(heart_rate.clamp(ECG_HR_MIN_BPM, ECG_HR_MAX_BPM).round())
}

/// HRV as RMSSD of successive R-R interval differences, clamped to 10–100 ms
pub fn hrv_from_rr_intervals(rr_intervals: &[f64]) -> Option<f64> {
    if rr_intervals.len() < 2 {
        return None;
    }

    let squared: Vec<f64> = rr_intervals
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .collect();
    let rmssd = (squared.iter().sum::<f64>() / squared.len() as f64).sqrt();

    Some(rmssd.clamp(10.0, 100.0).round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_out_of_range_live_counts_saturate() {
        let reading = assemble_reading(
            RawFields {
                heart_rate: Some(-12.0),
                hrv: Some(1e12),
                ..RawFields::default()
            },
            0,
        );
        assert_eq!(reading.heart_rate(), 0);
        assert_eq!(reading.hrv(), u32::MAX);
        assert!(reading.score() >= 0.0 && reading.score() <= 10.0);

        // in-range live values pass through unclamped
        let fast = assemble_reading(
            RawFields {
                heart_rate: Some(182.4),
                ..RawFields::default()
            },
            0,
        );
        assert_eq!(fast.heart_rate(), 182);
    }

    #[test]
    fn test_primary_keys() {
        let raw = TolerantExtractor
            .process(&json!({"hr": 88, "hrv": 31, "eda": 0.72, "temp": 33.9}))
            .unwrap();
        assert_eq!(raw.heart_rate, Some(88.0));
        assert_eq!(raw.hrv, Some(31.0));
        assert_eq!(raw.eda, Some(0.72));
        assert_eq!(raw.temperature, Some(33.9));
    }

    #[test]
    fn test_alternate_keys() {
        let raw = TolerantExtractor
            .process(&json!({"BPM": 64, "rmssd": 58.2, "skinConductance": 0.11, "skinTemp": 35.2}))
            .unwrap();
        assert_eq!(raw.heart_rate, Some(64.0));
        assert_eq!(raw.hrv, Some(58.2));
        assert_eq!(raw.eda, Some(0.11));
        assert_eq!(raw.temperature, Some(35.2));
    }

    #[test]
    fn test_key_priority_and_non_numeric_skip() {
        let raw = TolerantExtractor
            .process(&json!({"hr": "fast", "heartRate": 91, "BPM": 70}))
            .unwrap();
        assert_eq!(raw.heart_rate, Some(91.0));
    }

    #[test]
    fn test_missing_fields_use_baselines() {
        let raw = TolerantExtractor.process(&json!({"gsr": 0.9})).unwrap();
        let reading = assemble_reading(raw, 10);
        assert_eq!(reading.heart_rate(), 75);
        assert_eq!(reading.hrv(), 45);
        assert_eq!(reading.eda(), 0.9);
        assert_eq!(reading.temperature(), 34.5);
        assert_eq!(reading.timestamp(), 10);
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = TolerantExtractor.process(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, EmotiBitError::Payload { .. }));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_live_values_rounded_not_clamped() {
        let raw = RawFields {
            heart_rate: Some(171.6),
            hrv: Some(7.2),
            eda: Some(2.346),
            temperature: Some(38.26),
        };
        let reading = assemble_reading(raw, 0);
        assert_eq!(reading.heart_rate(), 172);
        assert_eq!(reading.hrv(), 7);
        assert_eq!(reading.eda(), 2.35);
        assert_eq!(reading.temperature(), 38.3);
        assert_eq!(reading.score(), 10.0);
    }

    #[test]
    fn test_heart_rate_from_ecg() {
        // Peaks every 250 samples at 250 Hz -> 60 bpm
        let mut ecg = vec![0.0; 1000];
        for peak in [100, 350, 600, 850] {
            ecg[peak] = 1.0;
        }
        assert_eq!(heart_rate_from_ecg(&ecg), Some(60.0));
    }

    #[test]
    fn test_heart_rate_from_short_ecg() {
        assert_eq!(heart_rate_from_ecg(&[0.0, 1.0, 0.0]), None);
        assert_eq!(heart_rate_from_ecg(&vec![0.0; 200]), None);
    }

    #[test]
    fn test_ecg_fallback_when_no_hr_key() {
        let mut ecg = vec![0.0; 500];
        for peak in [50, 175, 300, 425] {
            ecg[peak] = 2.0;
        }
        let raw = TolerantExtractor.process(&json!({ "ecg": ecg })).unwrap();
        // 125-sample spacing at 250 Hz -> 120 bpm
        assert_eq!(raw.heart_rate, Some(120.0));
    }

    #[test]
    fn test_hrv_from_rr_intervals() {
        // differences 20, -20, 20 -> rmssd 20
        assert_eq!(hrv_from_rr_intervals(&[800.0, 820.0, 800.0, 820.0]), Some(20.0));
        assert_eq!(hrv_from_rr_intervals(&[800.0]), None);
        // large swings clamp to 100
        assert_eq!(hrv_from_rr_intervals(&[600.0, 1000.0]), Some(100.0));
    }

    #[test]
    fn test_closure_processor() {
        let processor = |payload: &Value| -> EmotiBitResult<RawFields> {
            Ok(RawFields {
                heart_rate: payload["pulse"].as_f64(),
                ..RawFields::default()
            })
        };
        let raw = processor.process(&json!({"pulse": 99})).unwrap();
        assert_eq!(raw.heart_rate, Some(99.0));
    }
}
