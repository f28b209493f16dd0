//! Daemon-related errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// A service returned an error.
    #[error("Service {service} failed: {reason}")]
    ServiceFailed { service: String, reason: String },

    /// A service panicked or was aborted.
    #[error("Service {service} terminated abnormally: {reason}")]
    ServiceAborted { service: String, reason: String },

    /// A service did not stop within its grace period and was aborted.
    #[error("Service {service} did not stop within {grace:?}")]
    StopTimeout { service: String, grace: Duration },

    /// Services were started out of order.
    #[error("Cannot start {0} before the connection endpoint")]
    EndpointNotStarted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
