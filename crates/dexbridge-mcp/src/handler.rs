//! JSON-RPC dispatch onto the tool registry.

use std::sync::Arc;

use dexbridge_tools::{ToolContext, ToolError, ToolRegistry, ToolResult};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::protocol::{
    CallToolParams, McpContent, McpError, McpMethod, McpRequest, McpResponse, McpToolDefinition,
    McpToolResult,
};

/// Protocol revision announced when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name and version reported in `initialize`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "dex-browser".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Answers MCP requests. Shared by every transport.
pub struct McpHandler {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpHandler {
    pub fn new(registry: Arc<ToolRegistry>, info: ServerInfo) -> Self {
        Self { registry, info }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Handle a raw request body. `None` means nothing should be sent back.
    pub async fn handle_text(&self, body: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP request");
                return Some(McpResponse::error(None, McpError::parse_error()));
            }
        };
        let request: McpRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Invalid MCP request");
                return Some(McpResponse::error(None, McpError::invalid_request()));
            }
        };
        self.handle(request).await
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "MCP notification");
            return None;
        }

        let id = request.id.clone();
        let outcome = match McpMethod::parse(&request.method) {
            Some(McpMethod::Initialize) => Ok(self.initialize(request.params.as_ref())),
            Some(McpMethod::Ping) => Ok(json!({})),
            Some(McpMethod::ListTools) => Ok(self.list_tools()),
            Some(McpMethod::CallTool) => self.call_tool(request.params, id.as_ref()).await,
            None => {
                debug!(method = %request.method, "Unsupported MCP method");
                Err(McpError::method_not_found())
            }
        };

        Some(match outcome {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
            }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<McpToolDefinition> = self
            .registry
            .list()
            .into_iter()
            .map(|d| McpToolDefinition {
                name: d.name,
                description: Some(d.description),
                input_schema: d.parameters_schema,
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        id: Option<&crate::protocol::RequestId>,
    ) -> Result<Value, McpError> {
        let params: CallToolParams = params
            .ok_or_else(|| McpError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| McpError::invalid_params(format!("Invalid params: {}", e)))
            })?;

        let mut ctx = ToolContext::new("mcp");
        if let Some(id) = id {
            ctx = ctx.with_request_id(id.to_string());
        }

        let arguments = params.arguments.unwrap_or(Value::Null);
        let result = match self.registry.dispatch(&params.name, arguments, ctx).await {
            Ok(result) => to_mcp_result(result),
            Err(ToolError::NotFound(name)) => {
                return Err(McpError::invalid_params(format!("Unknown tool: {}", name)));
            }
            Err(e @ ToolError::ValidationFailed(_)) => {
                return Err(McpError::invalid_params(e.to_string()));
            }
            Err(e) => McpToolResult::error(e.to_string()),
        };

        serde_json::to_value(result).map_err(|_| McpError::internal_error())
    }
}

/// Split `data:<mime>;base64,<payload>`.
fn data_url(s: &str) -> Option<(String, String)> {
    let rest = s.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    mime.starts_with("image/")
        .then(|| (mime.to_string(), data.to_string()))
}

/// Look for a captured image in a reply payload.
fn image_content(data: &Value) -> Option<McpContent> {
    let candidate = match data {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["screenshot", "image", "dataUrl", "data_url"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str)),
        _ => None,
    }?;
    let (mime_type, data) = data_url(candidate)?;
    Some(McpContent::Image { data, mime_type })
}

fn to_mcp_result(result: ToolResult) -> McpToolResult {
    if !result.success {
        return McpToolResult::error(result.error.unwrap_or(result.content));
    }
    if let Some(image) = result.data.as_ref().and_then(image_content) {
        return McpToolResult {
            content: vec![image],
            is_error: false,
        };
    }
    McpToolResult::text(result.content)
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
