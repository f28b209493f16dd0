//! Bridge error types.

use thiserror::Error;

/// Failure of a single bridged call.
///
/// `Clone` because one connection loss fails every outstanding call with the
/// same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Caller supplied an unusable request. Never reaches the wire.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No extension is connected.
    #[error("Browser extension is not connected")]
    NotConnected,

    /// The deadline elapsed before a reply arrived.
    #[error("Timed out waiting for a reply to '{method}'")]
    Timeout { method: String },

    /// The connection closed or was replaced while the call was outstanding.
    #[error("Connection to the browser extension was lost")]
    ConnectionLost,

    /// The bridge stopped accepting calls.
    #[error("Bridge is shutting down")]
    ShuttingDown,

    /// The extension reported a failure; the message is passed through verbatim.
    #[error("{0}")]
    Remote(String),

    /// Request parameters could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// Stable machine-readable name, used in logs and HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Validation(_) => "validation",
            BridgeError::NotConnected => "not_connected",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::ConnectionLost => "connection_lost",
            BridgeError::ShuttingDown => "shutting_down",
            BridgeError::Remote(_) => "remote_error",
            BridgeError::Serialization(_) => "serialization",
        }
    }

    /// Whether the failure came from the transport rather than the request.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::NotConnected | BridgeError::ConnectionLost | BridgeError::ShuttingDown
        )
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Serialization(e.to_string())
    }
}
