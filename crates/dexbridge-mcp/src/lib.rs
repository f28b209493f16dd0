//! MCP front-end.
//!
//! Serves the tool catalogue to agent clients as JSON-RPC 2.0, either over
//! the SSE transport (`GET /sse` + `POST /messages/`) or as plain
//! request/response on `POST /mcp`.

mod handler;
pub mod protocol;
mod server;
mod session;

pub use handler::{McpHandler, ServerInfo, PROTOCOL_VERSION};
pub use server::{McpServer, bind_with_fallback};
pub use session::{SessionError, SessionManager};
