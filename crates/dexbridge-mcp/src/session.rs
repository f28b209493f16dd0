//! SSE sessions: one event channel per connected client.

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::McpResponse;

/// Responses buffered per session before senders wait.
const SESSION_BUFFER: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown session: {0}")]
    NotFound(String),

    #[error("Session stream closed: {0}")]
    Closed(String),
}

/// Live SSE sessions keyed by session id.
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<String, mpsc::Sender<McpResponse>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session. The receiver feeds that client's event stream.
    pub fn open(&self) -> (String, mpsc::Receiver<McpResponse>) {
        let id = Uuid::new_v4().simple().to_string();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions.insert(id.clone(), tx);
        debug!(session = %id, "MCP session opened");
        (id, rx)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Queue a response on a session's stream.
    pub async fn send(&self, id: &str, response: McpResponse) -> Result<(), SessionError> {
        // Clone the sender so no map guard is held across the await.
        let tx = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        tx.send(response)
            .await
            .map_err(|_| SessionError::Closed(id.to_string()))
    }

    pub fn close(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!(session = %id, "MCP session closed");
        }
        removed
    }

    /// Drop every session, ending their event streams.
    pub fn close_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
