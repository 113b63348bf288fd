// src/error.rs
//! Unified error handling for EmotiBit Core
//!
//! Errors never cross the public surface of [`BiometricService`]: transport
//! setup failures move acquisition to the next tier, runtime failures fall
//! back to simulation and payload failures drop a single message. The types
//! here carry enough context for those decisions to be logged.
//!
//! [`BiometricService`]: crate::acquisition::BiometricService

use crate::hal::TransportKind;
use thiserror::Error;

/// Unified error type for the acquisition pipeline
#[derive(Debug, Error)]
pub enum EmotiBitError {
    /// A transport tier could not be established
    #[error("[{transport}] connection failed: {reason}")]
    TransportSetup {
        transport: TransportKind,
        reason: String,
    },

    /// An established transport failed while streaming
    #[error("[{transport}] transport failed while streaming: {reason}")]
    TransportRuntime {
        transport: TransportKind,
        reason: String,
    },

    /// Handshake or request did not complete in time
    #[error("[{transport}] timed out after {after_ms} ms")]
    Timeout { transport: TransportKind, after_ms: u64 },

    /// A live payload could not be turned into a reading
    #[error("invalid payload: {reason}")]
    Payload { reason: String },

    /// Configuration values are missing or inconsistent
    #[error("configuration error in `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "bridge")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EmotiBitError {
    pub fn payload(reason: impl Into<String>) -> Self {
        EmotiBitError::Payload { reason: reason.into() }
    }

    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        EmotiBitError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Transport this error is attributed to, if any
    pub fn transport(&self) -> Option<TransportKind> {
        match self {
            EmotiBitError::TransportSetup { transport, .. }
            | EmotiBitError::TransportRuntime { transport, .. }
            | EmotiBitError::Timeout { transport, .. } => Some(*transport),
            _ => None,
        }
    }

    /// Whether the service should leave live mode because of this error
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            EmotiBitError::TransportRuntime { .. } | EmotiBitError::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for EmotiBitError {
    fn from(err: serde_json::Error) -> Self {
        EmotiBitError::payload(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for EmotiBitError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        EmotiBitError::TransportSetup {
            transport: TransportKind::WebSocket,
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EmotiBitError {
    fn from(err: reqwest::Error) -> Self {
        EmotiBitError::TransportSetup {
            transport: TransportKind::Http,
            reason: err.to_string(),
        }
    }
}

/// Result type alias for EmotiBit operations
pub type EmotiBitResult<T> = Result<T, EmotiBitError>;

/// Convenience trait for attributing foreign errors to a transport
pub trait IntoTransportError<T> {
    fn transport_err(self, transport: TransportKind) -> EmotiBitResult<T>;
}

impl<T, E> IntoTransportError<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn transport_err(self, transport: TransportKind) -> EmotiBitResult<T> {
        self.map_err(|err| EmotiBitError::TransportRuntime {
            transport,
            reason: err.to_string(),
        })
    }
}
