// src/hal/mod.rs
//! Transport tiers and the procedural simulator

pub mod traits;
pub mod types;
pub mod simulator;
pub mod websocket_driver;
pub mod http_driver;
pub mod serial_driver;


pub use traits::*;
pub use types::*;
pub use simulator::BiometricSimulator;
pub use websocket_driver::WebSocketStrategy;
pub use http_driver::HttpPollingStrategy;
pub use serial_driver::{parse_serial_line, SerialProbeStrategy};
