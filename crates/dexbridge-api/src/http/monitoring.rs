//! Health check.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use dexbridge_bridge::{ConnectionState, StatsSnapshot};
use serde::Serialize;

use crate::state::ApiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The extension is connected.
    Healthy,
    /// Serving, but browser tools will fail until the extension connects.
    Degraded,
    /// Shutting down.
    Unhealthy,
}

impl From<ConnectionState> for HealthStatus {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected => HealthStatus::Healthy,
            ConnectionState::Absent | ConnectionState::Closed => HealthStatus::Degraded,
            ConnectionState::Draining => HealthStatus::Unhealthy,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub connection: ConnectionState,
    pub pending_calls: usize,
    pub uptime_secs: u64,
    pub requests: u64,
    pub calls: StatsSnapshot,
}

pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let connection = state.bridge.connection_state();
    Json(HealthResponse {
        status: connection.into(),
        version: env!("CARGO_PKG_VERSION"),
        connection,
        pending_calls: state.bridge.pending_count(),
        uptime_secs: state.uptime().as_secs(),
        requests: state.request_count(),
        calls: state.bridge.stats(),
    })
}
