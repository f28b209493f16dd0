//! Tool registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info_span, Instrument};

use crate::error::ToolError;
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Registered tools, listed in registration order.
///
/// Built once at startup and shared read-only between front-ends.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.definition().name.clone();
        if self.index.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// List all tool definitions.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate and execute a tool by name.
    pub async fn dispatch(
        &self,
        name: &str,
        params: Value,
        ctx: ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        tool.validate(&params)?;

        let span = info_span!("tool", tool = name, origin = %ctx.origin);
        async move {
            debug!("Executing tool");
            let result = tool.execute(params, ctx).await;
            if let Err(e) = &result {
                debug!(error = %e, "Tool failed");
            }
            result
        }
        .instrument(span)
        .await
    }
}
