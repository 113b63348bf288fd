// src/processing/stress.rs
//! Stress score heuristics
//!
//! Each input is mapped onto a 0–10 sub-score with a fixed linear mapping:
//! heart rate rises from 60 bpm, HRV falls from 60 ms, EDA scales toward its
//! 1.5 µS maximum. The constants are reproduced as-is for compatibility with
//! existing dashboards.

use crate::config::constants::stress::*;
use serde::{Deserialize, Serialize};

/// How the three sub-scores are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressModel {
    /// Plain mean of the three sub-scores
    #[default]
    Balanced,
    /// 0.4 heart rate, 0.4 HRV, 0.2 EDA
    Weighted,
}

/// Per-signal contributions, each clamped to 0–10
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub heart_rate: f64,
    pub hrv: f64,
    pub eda: f64,
}

impl SubScores {
    pub fn from_inputs(heart_rate: f64, hrv: f64, eda: f64) -> Self {
        Self {
            heart_rate: clamp_score((heart_rate - HR_RESTING_BPM) / HR_SPAN_BPM * 10.0),
            hrv: clamp_score((HRV_REFERENCE_MS - hrv) / HRV_SPAN_MS * 10.0),
            eda: clamp_score(eda * EDA_SCALE),
        }
    }
}

impl StressModel {
    /// Unrounded score in 0–10
    pub fn raw_score(&self, heart_rate: f64, hrv: f64, eda: f64) -> f64 {
        let sub = SubScores::from_inputs(heart_rate, hrv, eda);
        let combined = match self {
            StressModel::Balanced => (sub.heart_rate + sub.hrv + sub.eda) / 3.0,
            StressModel::Weighted => {
                sub.heart_rate * WEIGHT_HR + sub.hrv * WEIGHT_HRV + sub.eda * WEIGHT_EDA
            }
        };
        clamp_score(combined)
    }

    /// Score rounded to one decimal place
    pub fn score(&self, heart_rate: f64, hrv: f64, eda: f64) -> f64 {
        round_to(self.raw_score(heart_rate, hrv, eda), 1)
    }
}

/// Score attached to every [`BiometricReading`](crate::hal::BiometricReading)
pub fn stress_score(heart_rate: u32, hrv: u32, eda: f64) -> f64 {
    StressModel::Balanced.score(heart_rate as f64, hrv as f64, eda)
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resting_values_score() {
        // hr 75 -> 2.5, hrv 45 -> 3.75, eda 0.3 -> 2.001
        assert_eq!(stress_score(75, 45, 0.3), 2.8);
    }

    #[test]
    fn test_sub_scores_clamp() {
        let low = SubScores::from_inputs(40.0, 120.0, 0.0);
        assert_eq!(low.heart_rate, 0.0);
        assert_eq!(low.hrv, 0.0);
        assert_eq!(low.eda, 0.0);

        let high = SubScores::from_inputs(200.0, 0.0, 5.0);
        assert_eq!(high.heart_rate, 10.0);
        assert_eq!(high.hrv, 10.0);
        assert_eq!(high.eda, 10.0);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(stress_score(60, 60, 0.0), 0.0);
        assert_eq!(stress_score(150, 10, 1.5), 10.0);
    }

    #[test]
    fn test_weighted_model() {
        // 0.4 * 2.5 + 0.4 * 3.75 + 0.2 * 2.001 = 2.9002
        let score = StressModel::Weighted.score(75.0, 45.0, 0.3);
        assert_eq!(score, 2.9);
    }

    #[test]
    fn test_score_is_deterministic() {
        let first = stress_score(98, 27, 0.84);
        for _ in 0..100 {
            assert_eq!(stress_score(98, 27, 0.84), first);
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(74.5, 0), 75.0);
    }

    proptest! {
        #[test]
        fn prop_score_bounded_and_one_decimal(hr in 0u32..300, hrv in 0u32..300, eda in 0.0f64..10.0) {
            let score = stress_score(hr, hrv, eda);
            prop_assert!((SCORE_MIN..=SCORE_MAX).contains(&score));
            prop_assert_eq!(round_to(score, 1), score);
            prop_assert_eq!(stress_score(hr, hrv, eda), score);
        }
    }
}
