//! Common utility functions for EmotiBit Core

pub mod time;

pub use time::{
    current_timestamp_millis,
    sample_period_millis,
    MockTimeProvider,
    SystemTimeProvider,
    TimeProvider,
};
