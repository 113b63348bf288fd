// src/hal/traits.rs
//! Acquisition seams between the service and the transport tiers

use crate::error::EmotiBitError;
use crate::hal::types::TransportKind;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Destination for payloads produced by one live acquisition session
pub trait ReadingSink: Send + Sync {
    /// Process one decoded payload.
    ///
    /// Returns `false` once the session is no longer current; the caller
    /// should stop reading and return.
    fn ingest(&self, payload: &Value) -> bool;

    /// Report that the live transport broke after it was established
    fn fail(&self, error: EmotiBitError);

    /// Whether the owning session is still current
    fn is_active(&self) -> bool;
}

pub type SharedSink = Arc<dyn ReadingSink>;

/// Result of one connection attempt
pub enum ConnectOutcome {
    /// Transport is up; the future streams payloads into the sink until the
    /// transport fails or the session ends. The caller spawns it only after
    /// recording the connected state.
    Connected(BoxFuture<'static, ()>),
    /// Transport could not be established, try the next tier
    Unavailable(EmotiBitError),
}

impl std::fmt::Debug for ConnectOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectOutcome::Connected(_) => f.write_str("Connected(..)"),
            ConnectOutcome::Unavailable(err) => f.debug_tuple("Unavailable").field(err).finish(),
        }
    }
}

/// One tier of the ordered acquisition sequence
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// Transport reported in the connection status while this tier is live
    fn transport(&self) -> TransportKind;

    /// Attempt to establish the transport within the configured timeout
    async fn try_connect(&self, sink: SharedSink) -> ConnectOutcome;
}
