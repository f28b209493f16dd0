//! HTTP API front-end for dexbridge.
//!
//! A conventional request/response surface next to the MCP server. It
//! shares the tool registry, and through it the command bridge, with every
//! other front-end.

mod error;
pub mod http;
mod server;
mod state;

pub use error::{ApiError, tool_status};
pub use server::{ApiServer, cors_layer};
pub use state::ApiState;
