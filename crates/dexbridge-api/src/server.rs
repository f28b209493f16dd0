//! HTTP API server.

use std::io;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::http::routes::create_router;
use crate::state::ApiState;

/// CORS layer for the configured browser origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

pub struct ApiServer {
    state: Arc<ApiState>,
    cors_origins: Vec<String>,
}

impl ApiServer {
    pub fn new(state: Arc<ApiState>, cors_origins: Vec<String>) -> Self {
        Self {
            state,
            cors_origins,
        }
    }

    pub fn state(&self) -> &Arc<ApiState> {
        &self.state
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
            .layer(cors_layer(&self.cors_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` is cancelled, then finish in-flight requests.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "HTTP API listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        info!("HTTP API stopped");
        Ok(())
    }
}
