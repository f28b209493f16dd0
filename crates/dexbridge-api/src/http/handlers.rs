//! API handlers.
//!
//! History and analytics routes keep the response shapes browser dashboards
//! already consume. The `/api/tools` routes expose the full catalogue.

use std::io;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dexbridge_tools::{ToolContext, ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::error::{ApiError, tool_status};
use crate::state::ApiState;

pub const DATE_REQUIRED: &str = "Date parameter is required";
pub const INVALID_JSON: &str = "Invalid JSON in request body";
pub const ANALYTICS_UNAVAILABLE: &str = "Analytics data not available";

const HISTORY_TOOL: &str = "query_history_by_date";
const ORIGIN: &str = "http";

#[derive(Debug, Deserialize)]
pub struct HistoryQueryRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryQueryResponse {
    pub result: String,
}

/// Tool information.
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolsListResponse {
    pub count: usize,
    pub tools: Vec<ToolInfo>,
}

pub async fn query_history_by_date(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<HistoryQueryResponse>, ApiError> {
    state.increment_requests();

    let request: HistoryQueryRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest(INVALID_JSON.to_string()))?;
    let date = match request.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => date.to_string(),
        _ => return Err(ApiError::BadRequest(DATE_REQUIRED.to_string())),
    };

    let result = state
        .registry
        .dispatch(HISTORY_TOOL, json!({ "date": date }), ToolContext::new(ORIGIN))
        .await;
    match result {
        Ok(result) => Ok(Json(HistoryQueryResponse {
            result: result.content,
        })),
        Err(ToolError::ValidationFailed(msg)) => Err(ApiError::BadRequest(msg)),
        Err(e) => {
            error!(error = %e, "Error processing history query");
            Err(ApiError::Internal)
        }
    }
}

pub async fn browsing_analytics(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Value>, ApiError> {
    state.increment_requests();

    let path = state.analytics_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(ANALYTICS_UNAVAILABLE.to_string()));
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read analytics");
            return Err(ApiError::Internal);
        }
    };
    serde_json::from_slice(&bytes).map(Json).map_err(|e| {
        error!(path = %path.display(), error = %e, "Analytics file is not valid JSON");
        ApiError::Internal
    })
}

pub async fn list_tools(State(state): State<Arc<ApiState>>) -> Json<ToolsListResponse> {
    let tools: Vec<ToolInfo> = state
        .registry
        .list()
        .into_iter()
        .map(|d| ToolInfo {
            name: d.name,
            description: d.description,
            parameters: d.parameters_schema,
        })
        .collect();
    Json(ToolsListResponse {
        count: tools.len(),
        tools,
    })
}

/// Invoke one tool. An empty body means no arguments.
pub async fn call_tool(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    state.increment_requests();

    let params = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(params) => params,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, Json(ToolResult::error(INVALID_JSON)))
                    .into_response();
            }
        }
    };

    match state
        .registry
        .dispatch(&name, params, ToolContext::new(ORIGIN))
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            let status = tool_status(&e);
            if status.is_server_error() {
                warn!(tool = %name, status = status.as_u16(), error = %e, "Tool call failed");
            }
            (status, Json(ToolResult::error(e.to_string()))).into_response()
        }
    }
}
