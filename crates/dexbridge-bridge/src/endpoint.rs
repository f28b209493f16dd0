//! WebSocket endpoint the browser extension connects to.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge::{CommandBridge, PeerLink};

/// Accepts extension connections and pumps frames between socket and bridge.
#[derive(Clone)]
pub struct ConnectionEndpoint {
    bridge: Arc<CommandBridge>,
    path: String,
    sweep_interval: Duration,
}

impl ConnectionEndpoint {
    pub fn new(bridge: Arc<CommandBridge>, path: impl Into<String>, sweep_interval: Duration) -> Self {
        Self {
            bridge,
            path: path.into(),
            sweep_interval,
        }
    }

    pub fn bridge(&self) -> &Arc<CommandBridge> {
        &self.bridge
    }

    /// Router with the upgrade route mounted at the configured path.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.path, get(ws_handler))
            .with_state(self.bridge.clone())
    }

    /// Serve on `listener` until `shutdown` is cancelled.
    ///
    /// Also runs the overdue-call sweeper. When the server stops, the live
    /// connection is closed.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, path = %self.path, "Extension endpoint listening");

        let sweeper = tokio::spawn(
            self.bridge
                .clone()
                .run_sweeper(self.sweep_interval, shutdown.child_token()),
        );

        // Upgraded sockets outlive the HTTP connection, so close ours explicitly.
        let signal = {
            let bridge = self.bridge.clone();
            let token = shutdown.clone();
            async move {
                token.cancelled().await;
                bridge.close_connection();
            }
        };

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await;

        shutdown.cancel();
        self.bridge.close_connection();
        if let Err(e) = sweeper.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
        info!("Extension endpoint stopped");
        result
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(bridge): State<Arc<CommandBridge>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, bridge))
}

async fn handle_socket(mut socket: WebSocket, bridge: Arc<CommandBridge>) {
    let link = match bridge.attach() {
        Ok(link) => link,
        Err(e) => {
            warn!(error = %e, "Rejecting extension connection");
            let _ = socket.send(close_message("shutting down")).await;
            return;
        }
    };

    let PeerLink {
        generation,
        mut outbound,
        closed,
    } = link;
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = closed.cancelled() => {
                debug!(generation, "Closing superseded connection");
                let _ = ws_tx.send(close_message("closed by bridge")).await;
                break;
            }

            frame = outbound.recv() => {
                let Some(text) = frame else { break };
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!(generation, error = %e, "Failed to write frame to extension");
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => bridge.handle_frame(text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => bridge.handle_frame(text),
                        Err(_) => warn!(generation, "Dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(generation, "Extension closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(generation, error = %e, "Extension socket error");
                        break;
                    }
                }
            }
        }
    }

    bridge.detach(generation);
}

fn close_message(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::NORMAL,
        reason: reason.into(),
    }))
}
