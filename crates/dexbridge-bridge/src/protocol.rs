//! Wire frames exchanged with the browser extension.
//!
//! Outbound: `{"id": <u64>, "method": "<name>", "params": {...}}`
//!
//! Inbound: `{"id": <u64>, "success": <bool>, "data": ..., "error": "<msg>"}`.
//! Extensions that put result fields at the top level instead of under `data`
//! are accepted too; everything other than `id`, `success` and `error` then
//! becomes the payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::correlation::{CallId, CallResult};
use crate::error::BridgeError;

/// Message used when the extension reports failure without saying why.
pub const UNKNOWN_REMOTE_ERROR: &str = "Unknown error";

/// Outbound request frame.
#[derive(Debug, Serialize)]
pub struct RequestFrame<'a> {
    pub id: CallId,
    pub method: &'a str,
    pub params: &'a Value,
}

/// Correlation id as sent back by the extension.
///
/// Some extension builds echo the id as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FrameId {
    Number(u64),
    Text(String),
}

impl FrameId {
    fn into_call_id(self) -> Result<CallId, FrameError> {
        match self {
            FrameId::Number(n) => Ok(n),
            FrameId::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| FrameError::InvalidId(s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplyFrame {
    #[serde(default)]
    id: Option<FrameId>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Decoded reply: which call it answers and how.
#[derive(Debug)]
pub struct Reply {
    pub id: CallId,
    pub outcome: CallResult,
}

/// Inbound frame that cannot be correlated.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(String),

    #[error("frame has no id")]
    MissingId,

    #[error("frame id is not a call id: {0}")]
    InvalidId(String),
}

/// Encode an outbound request frame.
pub fn encode_request(id: CallId, method: &str, params: &Value) -> Result<String, BridgeError> {
    let frame = RequestFrame { id, method, params };
    Ok(serde_json::to_string(&frame)?)
}

/// Extensions sometimes report structured errors; those are kept as JSON text.
fn error_message(error: Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Decode an inbound reply frame.
///
/// A frame with `success` absent counts as a success unless it carries an
/// `error`.
pub fn decode_reply(text: &str) -> Result<Reply, FrameError> {
    let frame: ReplyFrame =
        serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

    let id = frame.id.ok_or(FrameError::MissingId)?.into_call_id()?;
    let error = frame.error.and_then(error_message);
    let success = frame.success.unwrap_or(error.is_none());

    let outcome = if success {
        Ok(match frame.data {
            Some(data) => data,
            None if frame.rest.is_empty() => Value::Null,
            None => Value::Object(frame.rest),
        })
    } else {
        let message = error
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_REMOTE_ERROR.to_string());
        Err(BridgeError::Remote(message))
    };

    Ok(Reply { id, outcome })
}
