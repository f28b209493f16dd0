//! Per-invocation context.

/// Where a tool call came from.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Front-end name, e.g. `mcp` or `http`.
    pub origin: String,
    /// Front-end specific request id, for log correlation.
    pub request_id: Option<String>,
}

impl ToolContext {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}
