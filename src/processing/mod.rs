// src/processing/mod.rs
//! Turning raw payloads into readings, scores and recommendations

pub mod extraction;
pub mod recommendation;
pub mod stress;

pub use extraction::{assemble_reading, PayloadProcessor, TolerantExtractor};
pub use recommendation::{GameRecommendation, StressLevel};
pub use stress::{stress_score, StressModel};
