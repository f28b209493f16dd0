//! Tool trait definition.

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolContext, ToolDefinition, ToolResult};
use crate::error::ToolError;

/// Core trait for tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with the given parameters.
    async fn execute(&self, params: Value, ctx: ToolContext) -> Result<ToolResult, ToolError>;

    /// Validate the parameters before execution.
    ///
    /// Absent parameters are treated as an empty object.
    fn validate(&self, params: &Value) -> Result<(), ToolError> {
        if !(params.is_object() || params.is_null()) {
            return Err(ToolError::ValidationFailed(
                "Parameters must be an object".to_string(),
            ));
        }
        for name in self.definition().required_parameters() {
            match params.get(name) {
                None | Some(Value::Null) => {
                    return Err(ToolError::ValidationFailed(format!(
                        "{} parameter is required",
                        name
                    )));
                }
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(ToolError::ValidationFailed(format!(
                        "{} parameter must not be empty",
                        name
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
