//! Tool definition types.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Definition of a tool as advertised to front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name; the key front-ends dispatch on.
    pub name: String,

    /// Description shown to agents.
    pub description: String,

    /// JSON Schema for the parameters.
    pub parameters_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: empty_object_schema(),
        }
    }

    /// Set the parameters schema.
    pub fn with_parameters_schema(mut self, schema: Value) -> Self {
        self.parameters_schema = schema;
        self
    }

    /// Names listed under the schema's `required`.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

pub fn empty_object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}
