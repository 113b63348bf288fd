// src/acquisition/mod.rs
//! Acquisition service and reading history

pub mod reading_buffer;
pub mod service;

pub use reading_buffer::ReadingBuffer;
pub use service::{default_strategies, BiometricService, ServiceBuilder};
