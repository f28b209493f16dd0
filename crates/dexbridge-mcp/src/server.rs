//! HTTP routes for the MCP transports.

use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::handler::McpHandler;
use crate::session::{SessionError, SessionManager};

/// MCP server: SSE transport plus a request/response route.
#[derive(Clone)]
pub struct McpServer {
    handler: Arc<McpHandler>,
    sessions: Arc<SessionManager>,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Removes its session when the event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Arc<SessionManager>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.close(&self.id);
    }
}

impl McpServer {
    pub fn new(handler: Arc<McpHandler>) -> Self {
        Self {
            handler,
            sessions: Arc::new(SessionManager::new()),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/sse", get(sse_handler))
            .route("/messages", post(message_handler))
            .route("/messages/", post(message_handler))
            .route("/mcp", post(rpc_handler))
            .with_state(self.clone())
    }

    /// Serve until `shutdown` is cancelled. Open event streams are ended so
    /// the server can drain.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "MCP server listening (SSE at /sse)");

        let sessions = self.sessions.clone();
        let signal = async move {
            shutdown.cancelled().await;
            let closed = sessions.close_all();
            debug!(closed, "Closed MCP sessions");
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;
        info!("MCP server stopped");
        Ok(())
    }
}

/// Bind `host:port`, trying up to `attempts` consecutive ports.
pub async fn bind_with_fallback(host: &str, port: u16, attempts: u16) -> io::Result<TcpListener> {
    let mut last_err = None;
    for offset in 0..attempts.max(1) {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if offset > 0 {
                    warn!(requested = port, bound = candidate, "Port in use, using next free port");
                }
                return Ok(listener);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrInUse, format!("no free port from {}", port))
    }))
}

async fn sse_handler(
    State(server): State<McpServer>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, rx) = server.sessions.open();
    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={}", id));

    let guard = SessionGuard {
        id,
        sessions: server.sessions.clone(),
    };
    let messages = ReceiverStream::new(rx).filter_map(move |response| {
        let _session = &guard;
        let event = match serde_json::to_string(&response) {
            Ok(json) => Some(Event::default().event("message").data(json)),
            Err(e) => {
                warn!(error = %e, "Failed to encode MCP response");
                None
            }
        };
        futures::future::ready(event)
    });

    let stream = stream::once(futures::future::ready(endpoint))
        .chain(messages)
        .map(Ok);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn message_handler(
    State(server): State<McpServer>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    if !server.sessions.contains(&query.session_id) {
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    }

    // The reply travels on the event stream, so the POST returns at once.
    tokio::spawn(async move {
        let Some(response) = server.handler.handle_text(&body).await else {
            return;
        };
        match server.sessions.send(&query.session_id, response).await {
            Ok(()) => {}
            Err(SessionError::NotFound(id)) | Err(SessionError::Closed(id)) => {
                debug!(session = %id, "Session went away before its reply was sent");
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

async fn rpc_handler(State(server): State<McpServer>, body: String) -> Response {
    match server.handler.handle_text(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
