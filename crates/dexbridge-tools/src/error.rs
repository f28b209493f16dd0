//! Tool execution errors.

use dexbridge_bridge::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Parameter validation failed: {0}")]
    ValidationFailed(String),

    /// A bridged call failed. `context` is the tool's own failure sentence,
    /// e.g. `Failed to navigate to https://example.com`.
    #[error("{context}: {source}")]
    Bridge {
        context: String,
        #[source]
        source: BridgeError,
    },

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn bridge(context: impl Into<String>, source: BridgeError) -> Self {
        ToolError::Bridge {
            context: context.into(),
            source,
        }
    }

    /// The bridge failure, if this error wraps one.
    pub fn bridge_error(&self) -> Option<&BridgeError> {
        match self {
            ToolError::Bridge { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Errors caused by the request itself rather than its execution.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ToolError::NotFound(_) | ToolError::ValidationFailed(_)
        ) || matches!(self.bridge_error(), Some(BridgeError::Validation(_)))
    }
}
