// src/processing/recommendation.rs
//! Consumer-side mapping from stress score to a game and a display label

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stress buckets shared by the label and the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 3.0 {
            StressLevel::VeryLow
        } else if score <= 5.0 {
            StressLevel::Low
        } else if score <= 7.0 {
            StressLevel::Moderate
        } else {
            StressLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "Very Low",
            StressLevel::Low => "Low",
            StressLevel::Moderate => "Moderate",
            StressLevel::High => "High",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mini-game suggested for a stress level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameRecommendation {
    FlappyBreath,
    #[serde(rename = "fitcheck")]
    FitCheck,
    #[serde(rename = "memememer")]
    MeMeMeMer,
    #[serde(rename = "mumo")]
    MuMo,
}

impl GameRecommendation {
    pub fn for_score(score: f64) -> Self {
        match StressLevel::from_score(score) {
            StressLevel::VeryLow => GameRecommendation::FlappyBreath,
            StressLevel::Low => GameRecommendation::FitCheck,
            StressLevel::Moderate => GameRecommendation::MeMeMeMer,
            StressLevel::High => GameRecommendation::MuMo,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            GameRecommendation::FlappyBreath => "flappy-breath",
            GameRecommendation::FitCheck => "fitcheck",
            GameRecommendation::MeMeMeMer => "memememer",
            GameRecommendation::MuMo => "mumo",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameRecommendation::FlappyBreath => "Flappy Breath",
            GameRecommendation::FitCheck => "FitCheck",
            GameRecommendation::MeMeMeMer => "MeMeMeMer",
            GameRecommendation::MuMo => "MuMo",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameRecommendation::FlappyBreath => "Calm breathing exercises to reduce stress",
            GameRecommendation::FitCheck => "Light interactive fashion exploration",
            GameRecommendation::MeMeMeMer => "Humor therapy with memes and puzzles",
            GameRecommendation::MuMo => "Music and movies for mood reset",
        }
    }
}
