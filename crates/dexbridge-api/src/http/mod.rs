//! HTTP routes and handlers.

pub mod handlers;
pub(crate) mod monitoring;
pub mod routes;
