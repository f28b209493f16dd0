//! The command bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::correlation::{CallId, CallResult, CorrelationTable};
use crate::error::BridgeError;
use crate::protocol;

/// Used when a timeout is too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline `timeout` from now, clamped so oversized timeouts never overflow.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Lifecycle of the extension connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Nothing has connected yet.
    Absent,
    Connected,
    /// Shutdown began; no new calls are accepted.
    Draining,
    /// The last connection went away.
    Closed,
}

/// Handle given to the endpoint task serving one accepted connection.
pub struct PeerLink {
    /// Generation of this connection. Passed back to [`CommandBridge::detach`].
    pub generation: u64,
    /// Frames to write to the socket, in order.
    pub outbound: mpsc::UnboundedReceiver<String>,
    /// Cancelled when the bridge wants this socket closed.
    pub closed: CancellationToken,
}

/// The live side of a [`PeerLink`], kept in the connection slot.
struct ActiveLink {
    generation: u64,
    outbound: mpsc::UnboundedSender<String>,
    closed: CancellationToken,
}

struct BridgeInner {
    state: ConnectionState,
    link: Option<ActiveLink>,
    table: CorrelationTable,
    accepting: bool,
    next_generation: u64,
}

/// Running counters.
#[derive(Debug, Default)]
pub struct BridgeStats {
    issued: AtomicU64,
    completed: AtomicU64,
    remote_errors: AtomicU64,
    timed_out: AtomicU64,
    connection_failures: AtomicU64,
    connections: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub issued: u64,
    pub completed: u64,
    pub remote_errors: u64,
    pub timed_out: u64,
    pub connection_failures: u64,
    pub connections: u64,
}

impl BridgeStats {
    fn record(&self, result: &CallResult) {
        let counter = match result {
            Ok(_) => &self.completed,
            Err(BridgeError::Remote(_)) => &self.remote_errors,
            Err(BridgeError::Timeout { .. }) => &self.timed_out,
            Err(_) => &self.connection_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            remote_errors: self.remote_errors.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            connection_failures: self.connection_failures.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
        }
    }
}

/// Routes tool calls to the browser extension and their replies back.
///
/// At most one extension connection is live. A newer connection replaces the
/// older one, and calls registered against the older one fail with
/// `ConnectionLost`.
pub struct CommandBridge {
    inner: Mutex<BridgeInner>,
    next_id: AtomicU64,
    stats: BridgeStats,
    default_timeout: Duration,
}

impl CommandBridge {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BridgeInner {
                state: ConnectionState::Absent,
                link: None,
                table: CorrelationTable::new(),
                accepting: true,
                next_generation: 1,
            }),
            next_id: AtomicU64::new(1),
            stats: BridgeStats::default(),
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Issue `method` with the default timeout.
    pub async fn call(&self, method: &str, params: Value) -> CallResult {
        self.invoke(method, params, self.default_timeout).await
    }

    /// Issue `method` to the extension and wait for its reply.
    ///
    /// Exactly one outcome is delivered: the extension's payload, its error,
    /// `Timeout` once `timeout` elapses, or a connection failure.
    pub async fn invoke(&self, method: &str, params: Value, timeout: Duration) -> CallResult {
        let method = method.trim();
        if method.is_empty() {
            return Err(BridgeError::Validation("method must not be empty".into()));
        }

        let deadline = deadline_after(timeout);
        let (id, mut rx) = {
            let mut inner = self.inner.lock();
            if !inner.accepting {
                return Err(BridgeError::ShuttingDown);
            }
            let outbound = match inner.link.as_ref() {
                Some(link) => link.outbound.clone(),
                None => return Err(BridgeError::NotConnected),
            };

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let frame = protocol::encode_request(id, method, &params)?;
            let rx = inner.table.register(id, method, deadline);

            // Sent under the lock: a replacement cannot slip in between
            // registering against this connection and writing to it.
            if outbound.send(frame).is_err() {
                inner.table.remove(id);
                self.stats.connection_failures.fetch_add(1, Ordering::Relaxed);
                return Err(BridgeError::ConnectionLost);
            }
            (id, rx)
        };

        self.stats.issued.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "Call issued");

        let result = match tokio::time::timeout_at(deadline, &mut rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::ConnectionLost),
            Err(_) => {
                let abandoned = self.inner.lock().table.remove(id);
                if abandoned {
                    warn!(id, method, timeout_ms = timeout.as_millis() as u64, "Call timed out");
                    Err(BridgeError::Timeout {
                        method: method.to_string(),
                    })
                } else {
                    // Completed between the deadline firing and the lock.
                    rx.try_recv().unwrap_or_else(|_| {
                        Err(BridgeError::Timeout {
                            method: method.to_string(),
                        })
                    })
                }
            }
        };

        self.stats.record(&result);
        result
    }

    /// Install a newly accepted connection, replacing any current one.
    pub fn attach(&self) -> Result<PeerLink, BridgeError> {
        let mut inner = self.inner.lock();
        if !inner.accepting {
            return Err(BridgeError::ShuttingDown);
        }

        if let Some(old) = inner.link.take() {
            old.closed.cancel();
            let orphaned = inner.table.drain(BridgeError::ConnectionLost);
            warn!(
                generation = old.generation,
                orphaned, "Replacing existing extension connection"
            );
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        inner.link = Some(ActiveLink {
            generation,
            outbound: tx,
            closed: closed.clone(),
        });
        inner.state = ConnectionState::Connected;
        self.stats.connections.fetch_add(1, Ordering::Relaxed);
        info!(generation, "Extension connected");

        Ok(PeerLink {
            generation,
            outbound: rx,
            closed,
        })
    }

    /// Report that the connection of `generation` ended.
    ///
    /// Fails its outstanding calls with `ConnectionLost`. A stale generation
    /// (already replaced) is ignored. Returns how many calls were failed.
    pub fn detach(&self, generation: u64) -> usize {
        let mut inner = self.inner.lock();
        match inner.link.as_ref() {
            Some(link) if link.generation == generation => {}
            _ => return 0,
        }

        inner.link = None;
        if inner.state != ConnectionState::Draining {
            inner.state = ConnectionState::Closed;
        }
        let orphaned = inner.table.drain(BridgeError::ConnectionLost);
        info!(generation, orphaned, "Extension disconnected");
        orphaned
    }

    /// Handle one inbound text frame from the extension.
    ///
    /// Malformed frames and replies to unknown ids are dropped.
    pub fn handle_frame(&self, text: &str) {
        let reply = match protocol::decode_reply(text) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame from extension");
                return;
            }
        };

        let id = reply.id;
        let known = self.inner.lock().table.complete(id, reply.outcome);
        if known {
            debug!(id, "Reply delivered");
        } else {
            debug!(id, "Discarding reply for unknown or expired call");
        }
    }

    /// Fail every call whose deadline has passed. Returns how many expired.
    pub fn sweep_expired(&self) -> usize {
        let expired = self.inner.lock().table.expire_overdue(Instant::now());
        if expired > 0 {
            debug!(expired, "Swept overdue calls");
        }
        expired
    }

    /// Periodically sweep overdue calls until `token` is cancelled.
    pub async fn run_sweeper(self: Arc<Self>, interval: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_expired();
                }
            }
        }
    }

    /// Stop accepting new calls and connections.
    pub fn begin_shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.accepting = false;
        inner.state = ConnectionState::Draining;
        info!(pending = inner.table.len(), "Bridge stopped accepting calls");
    }

    /// Fail every outstanding call with `error`.
    pub fn drain(&self, error: BridgeError) -> usize {
        self.inner.lock().table.drain(error)
    }

    /// Close the current connection, if any.
    ///
    /// Calls still outstanding fail with `ConnectionLost`.
    pub fn close_connection(&self) -> usize {
        let mut inner = self.inner.lock();
        let Some(link) = inner.link.take() else {
            if inner.state == ConnectionState::Draining {
                inner.state = ConnectionState::Closed;
            }
            return 0;
        };
        link.closed.cancel();
        inner.state = ConnectionState::Closed;
        let orphaned = inner.table.drain(BridgeError::ConnectionLost);
        info!(generation = link.generation, orphaned, "Closed extension connection");
        orphaned
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().link.is_some()
    }

    /// Generation of the live connection.
    pub fn generation(&self) -> Option<u64> {
        self.inner.lock().link.as_ref().map(|l| l.generation)
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.lock().accepting
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().table.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    #[cfg(test)]
    fn is_pending(&self, id: CallId) -> bool {
        self.inner.lock().table.contains(id)
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
