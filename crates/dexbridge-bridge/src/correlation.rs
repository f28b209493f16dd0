//! Correlation table: outstanding calls keyed by id.
//!
//! The table is plain data. [`CommandBridge`](crate::CommandBridge) owns it
//! behind the same lock as the connection slot; nothing here synchronizes.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

use crate::error::BridgeError;

/// Correlation id. Unique for the lifetime of the process.
pub type CallId = u64;

/// What a parked caller eventually receives.
pub type CallResult = Result<Value, BridgeError>;

struct PendingCall {
    method: String,
    deadline: Instant,
    completion: oneshot::Sender<CallResult>,
}

/// Outstanding calls awaiting a reply.
///
/// Every completion path removes the entry first and then fills the slot, so
/// a second completion for the same id finds nothing and is a no-op.
#[derive(Default)]
pub struct CorrelationTable {
    calls: HashMap<CallId, PendingCall>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call and return the receiving half of its completion slot.
    ///
    /// Ids are expected to be fresh; registering an id that is still
    /// outstanding fails the older call with `ConnectionLost`.
    pub fn register(
        &mut self,
        id: CallId,
        method: impl Into<String>,
        deadline: Instant,
    ) -> oneshot::Receiver<CallResult> {
        let (tx, rx) = oneshot::channel();
        let call = PendingCall {
            method: method.into(),
            deadline,
            completion: tx,
        };
        if let Some(old) = self.calls.insert(id, call) {
            let _ = old.completion.send(Err(BridgeError::ConnectionLost));
        }
        rx
    }

    /// Complete a call with a value. Returns false if the id is unknown.
    pub fn resolve(&mut self, id: CallId, value: Value) -> bool {
        self.complete(id, Ok(value))
    }

    /// Complete a call with an error. Returns false if the id is unknown.
    pub fn fail(&mut self, id: CallId, error: BridgeError) -> bool {
        self.complete(id, Err(error))
    }

    /// Complete with either outcome.
    pub fn complete(&mut self, id: CallId, result: CallResult) -> bool {
        match self.calls.remove(&id) {
            Some(call) => {
                // The waiter may have given up already; that is not an error.
                let _ = call.completion.send(result);
                true
            }
            None => false,
        }
    }

    /// Drop an entry without completing it. Used by a waiter abandoning its
    /// own call.
    pub fn remove(&mut self, id: CallId) -> bool {
        self.calls.remove(&id).is_some()
    }

    /// Fail every outstanding call with `error`. Returns how many were failed.
    pub fn drain(&mut self, error: BridgeError) -> usize {
        let count = self.calls.len();
        for (id, call) in self.calls.drain() {
            trace!(id, method = %call.method, "Failing outstanding call");
            let _ = call.completion.send(Err(error.clone()));
        }
        count
    }

    /// Fail every call whose deadline is at or before `now` with `Timeout`.
    pub fn expire_overdue(&mut self, now: Instant) -> usize {
        let overdue: Vec<CallId> = self
            .calls
            .iter()
            .filter(|(_, call)| call.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in &overdue {
            if let Some(call) = self.calls.remove(id) {
                let _ = call.completion.send(Err(BridgeError::Timeout {
                    method: call.method,
                }));
            }
        }
        overdue.len()
    }

    pub fn contains(&self, id: CallId) -> bool {
        self.calls.contains_key(&id)
    }

    /// Method name of an outstanding call.
    pub fn method_of(&self, id: CallId) -> Option<&str> {
        self.calls.get(&id).map(|c| c.method.as_str())
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
