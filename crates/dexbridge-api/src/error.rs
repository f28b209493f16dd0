//! API error types and status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dexbridge_bridge::BridgeError;
use dexbridge_tools::ToolError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the fixed `/api` routes, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// HTTP status for a failed tool invocation.
pub fn tool_status(err: &ToolError) -> StatusCode {
    match err {
        ToolError::NotFound(_) => StatusCode::NOT_FOUND,
        ToolError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        ToolError::Bridge { source, .. } => match source {
            BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::NotConnected
            | BridgeError::ConnectionLost
            | BridgeError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            BridgeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BridgeError::Remote(_) => StatusCode::BAD_GATEWAY,
            BridgeError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ToolError::AlreadyRegistered(_) | ToolError::ExecutionFailed(_) | ToolError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
