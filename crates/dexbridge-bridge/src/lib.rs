//! Command bridge between tool front-ends and the browser extension.
//!
//! Every front-end holds an `Arc<CommandBridge>` and calls
//! [`CommandBridge::invoke`]. The bridge tags each call with a correlation id,
//! writes one frame to the extension's WebSocket, and parks the caller until
//! the matching reply, the deadline, or a connection failure resolves it.
//!
//! ```text
//! ┌──────────────┐                                   ┌──────────────────┐
//! │ MCP front-end│──┐                                │                  │
//! └──────────────┘  │  invoke   ┌───────────────┐  WS │ Browser extension│
//!                   ├─────────► │ CommandBridge │◄───►│     (peer)       │
//! ┌──────────────┐  │           │  + table      │     │                  │
//! │ HTTP API     │──┘           └───────────────┘     └──────────────────┘
//! └──────────────┘
//! ```
//!
//! The connection slot and the [`CorrelationTable`] sit behind a single lock
//! inside the bridge, so a call is either registered against the live
//! connection or rejected, never stranded between two connections.

mod bridge;
mod correlation;
mod endpoint;
mod error;
pub mod protocol;

pub use bridge::{BridgeStats, CommandBridge, ConnectionState, PeerLink, StatsSnapshot};
pub use correlation::{CallId, CallResult, CorrelationTable};
pub use endpoint::ConnectionEndpoint;
pub use error::BridgeError;
