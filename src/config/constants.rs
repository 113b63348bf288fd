// src/config/constants.rs
//! System-wide configuration constants

/// Biometric signal ranges and precision
pub mod signal {
    pub const HEART_RATE_MIN_BPM: f64 = 50.0;
    pub const HEART_RATE_MAX_BPM: f64 = 150.0;
    pub const HRV_MIN_MS: f64 = 10.0;
    pub const HRV_MAX_MS: f64 = 100.0;
    pub const EDA_MIN_US: f64 = 0.05;
    pub const EDA_MAX_US: f64 = 1.5;
    pub const TEMP_MIN_C: f64 = 32.0;
    pub const TEMP_MAX_C: f64 = 37.0;

    // Resting baselines, also used when a live payload omits a field
    pub const BASELINE_HEART_RATE_BPM: f64 = 75.0;
    pub const BASELINE_HRV_MS: f64 = 45.0;
    pub const BASELINE_EDA_US: f64 = 0.3;
    pub const BASELINE_TEMP_C: f64 = 34.5;
}

/// Stress score heuristic constants
pub mod stress {
    pub const SCORE_MIN: f64 = 0.0;
    pub const SCORE_MAX: f64 = 10.0;

    pub const HR_RESTING_BPM: f64 = 60.0;
    pub const HR_SPAN_BPM: f64 = 60.0;
    pub const HRV_REFERENCE_MS: f64 = 60.0;
    pub const HRV_SPAN_MS: f64 = 40.0;
    pub const EDA_SCALE: f64 = 6.67;

    pub const WEIGHT_HR: f64 = 0.4;
    pub const WEIGHT_HRV: f64 = 0.4;
    pub const WEIGHT_EDA: f64 = 0.2;
}

/// Procedural simulation constants
pub mod simulation {
    pub const OSCILLATION_PERIOD_MS: f64 = 30_000.0;
    pub const OSCILLATION_AMPLITUDE: f64 = 0.3;
    pub const NOISE_AMPLITUDE: f64 = 0.2;

    pub const HR_VARIATION_GAIN: f64 = 20.0;
    pub const HR_NOISE_GAIN: f64 = 15.0;
    pub const HRV_VARIATION_GAIN: f64 = 15.0;
    pub const HRV_NOISE_GAIN: f64 = 10.0;
    pub const EDA_VARIATION_GAIN: f64 = 0.4;
    pub const EDA_NOISE_GAIN: f64 = 0.3;
    pub const TEMP_VARIATION_GAIN: f64 = 1.5;
    pub const TEMP_NOISE_GAIN: f64 = 0.5;

    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
}

/// Transport tier constants
pub mod hal {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 25;
    pub const MAX_SAMPLE_RATE_HZ: u32 = 1000;
    pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 3000;
    pub const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:8080/emotibit";
    pub const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:8080/api/emotibit";
    pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";
    pub const DEFAULT_SERIAL_BAUD_RATE: u32 = 115_200;

    // ECG-derived heart rate
    pub const ECG_SAMPLE_RATE_HZ: f64 = 250.0;
    pub const ECG_MIN_SAMPLES: usize = 100;
    pub const ECG_PEAK_THRESHOLD_RATIO: f64 = 0.6;
    pub const ECG_HR_MIN_BPM: f64 = 40.0;
    pub const ECG_HR_MAX_BPM: f64 = 200.0;
}

/// Reading buffer constants
pub mod buffer {
    pub const DEFAULT_BUFFER_SIZE: usize = 1000;
    pub const MAX_RETAINED_READINGS: usize = 100;
}

/// Consumer-side polling
pub mod consumer {
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
}

/// Configuration file discovery
pub mod paths {
    pub const CONFIG_FILE_NAMES: &[&str] = &["emotibit.toml", "config/emotibit.toml"];
    pub const ENV_PREFIX: &str = "EMOTIBIT";
    pub const DEFAULT_CSV_FILE: &str = "emotibit_live.csv";
    pub const DEFAULT_BRIDGE_BIND: &str = "0.0.0.0:8080";
}
