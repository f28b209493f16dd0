//! HTTP route definitions.
//!
//! ```text
//! POST /api/query_history_by_date  - History summary for a date
//! GET  /api/browsing_analytics     - Last generated analytics summary
//! GET  /api/tools                  - Tool catalogue
//! POST /api/tools/{name}           - Invoke a tool
//! GET  /health                     - Bridge and server health
//! ```

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::http::handlers;
use crate::http::monitoring;
use crate::state::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let api_routes = Router::new()
        .route("/query_history_by_date", post(handlers::query_history_by_date))
        .route("/browsing_analytics", get(handlers::browsing_analytics))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/{name}", post(handlers::call_tool));

    Router::new()
        .route("/health", get(monitoring::health))
        .nest("/api", api_routes)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
