// src/hal/simulator.rs
//! Procedural biometric simulator
//!
//! Each tick derives two shared drivers: a slow sine oscillation over wall
//! clock time (30 s period) and a small uniform noise term. Four independent
//! field generators turn those drivers into heart rate, HRV, EDA and skin
//! temperature, each clamped to its physiological range.

use crate::config::constants::{signal::*, simulation::*};
use crate::hal::BiometricReading;
use crate::processing::stress::round_to;
use crate::utils::time::{SystemTimeProvider, TimeProvider};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Shared drivers for one simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDrivers {
    /// Slow oscillation in [-0.3, 0.3]
    pub variation: f64,
    /// Uniform noise in [-0.1, 0.1)
    pub noise: f64,
}

impl SignalDrivers {
    /// Zero drivers: every generator returns its resting baseline
    pub const RESTING: SignalDrivers = SignalDrivers {
        variation: 0.0,
        noise: 0.0,
    };

    pub fn new(timestamp_ms: u64, unit_random: f64) -> Self {
        Self {
            variation: (timestamp_ms as f64 / OSCILLATION_PERIOD_MS).sin() * OSCILLATION_AMPLITUDE,
            noise: (unit_random - 0.5) * NOISE_AMPLITUDE,
        }
    }
}

pub fn simulated_heart_rate(d: SignalDrivers) -> u32 {
    let hr = BASELINE_HEART_RATE_BPM + d.variation * HR_VARIATION_GAIN + d.noise * HR_NOISE_GAIN;
    hr.clamp(HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM).round() as u32
}

pub fn simulated_hrv(d: SignalDrivers) -> u32 {
    let hrv = BASELINE_HRV_MS + d.variation * HRV_VARIATION_GAIN + d.noise * HRV_NOISE_GAIN;
    hrv.clamp(HRV_MIN_MS, HRV_MAX_MS).round() as u32
}

pub fn simulated_eda(d: SignalDrivers) -> f64 {
    let eda = BASELINE_EDA_US
        + d.variation.abs() * EDA_VARIATION_GAIN
        + d.noise.abs() * EDA_NOISE_GAIN;
    round_to(eda.clamp(EDA_MIN_US, EDA_MAX_US), 2)
}

pub fn simulated_temperature(d: SignalDrivers) -> f64 {
    let temp = BASELINE_TEMP_C + d.variation * TEMP_VARIATION_GAIN + d.noise * TEMP_NOISE_GAIN;
    round_to(temp.clamp(TEMP_MIN_C, TEMP_MAX_C), 1)
}

/// Build a reading from explicit drivers
pub fn reading_from_drivers(drivers: SignalDrivers, timestamp_ms: u64) -> BiometricReading {
    BiometricReading::new(
        simulated_heart_rate(drivers),
        simulated_hrv(drivers),
        simulated_eda(drivers),
        simulated_temperature(drivers),
        timestamp_ms,
    )
}

/// Reading generator backed by a clock and a random source
pub struct BiometricSimulator {
    clock: Arc<dyn TimeProvider>,
    rng: Mutex<StdRng>,
}

impl BiometricSimulator {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible noise sequence, for tests and demos
    pub fn with_seed(clock: Arc<dyn TimeProvider>, seed: u64) -> Self {
        Self {
            clock,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemTimeProvider))
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Drivers for the current instant
    pub fn drivers(&self) -> (SignalDrivers, u64) {
        let timestamp = self.clock.now_millis();
        let unit: f64 = self.rng.lock().gen();
        (SignalDrivers::new(timestamp, unit), timestamp)
    }

    /// Produce one simulated reading stamped with the current time
    pub fn generate(&self) -> BiometricReading {
        let (drivers, timestamp) = self.drivers();
        reading_from_drivers(drivers, timestamp)
    }
}

impl std::fmt::Debug for BiometricSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiometricSimulator")
            .field("now_millis", &self.clock.now_millis())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::MockTimeProvider;
    use proptest::prelude::*;

    #[test]
    fn test_resting_drivers_give_baselines() {
        let reading = reading_from_drivers(SignalDrivers::RESTING, 0);
        assert_eq!(reading.heart_rate(), 75);
        assert_eq!(reading.hrv(), 45);
        assert_eq!(reading.eda(), 0.3);
        assert_eq!(reading.temperature(), 34.5);
        assert_eq!(reading.score(), 2.8);
    }

    #[test]
    fn test_peak_oscillation() {
        // sin(pi/2) at t = 30000 * pi/2
        let t = (OSCILLATION_PERIOD_MS * std::f64::consts::FRAC_PI_2) as u64;
        let drivers = SignalDrivers::new(t, 0.5);
        assert!((drivers.variation - 0.3).abs() < 1e-6);
        assert_eq!(drivers.noise, 0.0);
    }

    #[test]
    fn test_generators_follow_drivers() {
        let drivers = SignalDrivers {
            variation: 0.2,
            noise: 0.0,
        };
        assert_eq!(simulated_heart_rate(drivers), 79);
        assert_eq!(simulated_hrv(drivers), 48);
        assert_eq!(simulated_eda(drivers), 0.38);
        assert_eq!(simulated_temperature(drivers), 34.8);
    }

    #[test]
    fn test_simulator_uses_clock() {
        let clock = Arc::new(MockTimeProvider::new(1_700_000_000_000));
        let simulator = BiometricSimulator::with_seed(clock.clone(), 7);

        let first = simulator.generate();
        assert_eq!(first.timestamp(), 1_700_000_000_000);

        clock.advance_by(1_000);
        let second = simulator.generate();
        assert_eq!(second.timestamp(), 1_700_000_001_000);
    }

    #[test]
    fn test_seeded_simulators_agree() {
        let clock = Arc::new(MockTimeProvider::new(123_456));
        let a = BiometricSimulator::with_seed(clock.clone(), 99);
        let b = BiometricSimulator::with_seed(clock, 99);
        for _ in 0..20 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    proptest! {
        #[test]
        fn prop_generated_fields_within_ranges(t in 0u64..4_000_000_000_000, unit in 0.0f64..1.0) {
            let reading = reading_from_drivers(SignalDrivers::new(t, unit), t);
            prop_assert!((50..=150).contains(&reading.heart_rate()));
            prop_assert!((10..=100).contains(&reading.hrv()));
            prop_assert!(reading.eda() >= EDA_MIN_US && reading.eda() <= EDA_MAX_US);
            prop_assert!(reading.temperature() >= TEMP_MIN_C && reading.temperature() <= TEMP_MAX_C);
            prop_assert!(reading.score() >= 0.0 && reading.score() <= 10.0);
        }

        #[test]
        fn prop_extreme_drivers_stay_clamped(variation in -50.0f64..50.0, noise in -50.0f64..50.0) {
            let drivers = SignalDrivers { variation, noise };
            prop_assert!((50..=150).contains(&simulated_heart_rate(drivers)));
            prop_assert!((10..=100).contains(&simulated_hrv(drivers)));
            let eda = simulated_eda(drivers);
            prop_assert!(eda >= EDA_MIN_US && eda <= EDA_MAX_US);
            let temp = simulated_temperature(drivers);
            prop_assert!(temp >= TEMP_MIN_C && temp <= TEMP_MAX_C);
        }
    }
}
