//! Browser tools: one bridge call per invocation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dexbridge_bridge::CommandBridge;
use serde_json::Value;
use tracing::debug;

use crate::command::{BrowserCommand, CommandKind};
use crate::error::ToolError;
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Per-call deadlines handed to the bridge.
#[derive(Debug, Clone, Copy)]
pub struct CallTimeouts {
    pub default: Duration,
    /// Used for commands that return page captures.
    pub slow: Duration,
}

impl CallTimeouts {
    pub fn for_kind(&self, kind: CommandKind) -> Duration {
        if kind.is_slow() { self.slow } else { self.default }
    }
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(30),
            slow: Duration::from_secs(60),
        }
    }
}

/// A browser tool backed by the command bridge.
pub struct BrowserTool {
    kind: CommandKind,
    definition: ToolDefinition,
    bridge: Arc<CommandBridge>,
    timeouts: CallTimeouts,
}

impl BrowserTool {
    pub fn new(kind: CommandKind, bridge: Arc<CommandBridge>, timeouts: CallTimeouts) -> Self {
        Self {
            kind,
            definition: kind.definition(),
            bridge,
            timeouts,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }
}

#[async_trait]
impl Tool for BrowserTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let command = BrowserCommand::parse(self.kind, &params)?;
        let timeout = self.timeouts.for_kind(self.kind);

        debug!(method = command.method(), ?timeout, "Forwarding browser command");
        match self
            .bridge
            .invoke(command.method(), command.params(), timeout)
            .await
        {
            Ok(payload) => Ok(render_success(&command, payload)),
            Err(e) => Err(ToolError::bridge(failure_context(&command), e)),
        }
    }
}

fn field<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload
        .get(key)
        .or_else(|| payload.get("data").and_then(|d| d.get(key)))
}

fn field_str(payload: &Value, key: &str) -> Option<String> {
    field(payload, key).and_then(Value::as_str).map(str::to_string)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `Action: <action> - <message>`, with the reply's fields overriding defaults.
fn action_line(payload: &Value, action: &str, message: String) -> String {
    let action = field_str(payload, "action").unwrap_or_else(|| action.to_string());
    let message = field_str(payload, "message").unwrap_or(message);
    format!("Action: {} - {}", action, message)
}

fn tab_label(tab_id: &Option<i64>) -> String {
    tab_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(active)".to_string())
}

/// Raw payloads (screenshots, DOM dumps) are passed through as text.
fn passthrough(payload: Value) -> ToolResult {
    let content = match &payload {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    ToolResult::success_json(content, payload)
}

fn render_tabs(payload: &Value) -> String {
    let tabs = match payload {
        Value::Array(tabs) => Some(tabs),
        other => field(other, "tabs").and_then(Value::as_array),
    };
    let Some(tabs) = tabs else {
        return "No tabs found or unable to fetch tabs.".to_string();
    };
    if tabs.is_empty() {
        return "No open tabs found.".to_string();
    }

    let blocks: Vec<String> = tabs
        .iter()
        .map(|tab| {
            let id = tab.get("id").map(display).unwrap_or_else(|| "Unknown".into());
            let title = tab
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .unwrap_or("Untitled");
            let mut block = format!("Tab {}: {}", id, title);
            if let Some(url) = tab.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) {
                block.push_str(&format!("\n  URL: {}", url));
            }
            block
        })
        .collect();

    format!("Found {} open tabs:\n\n{}", tabs.len(), blocks.join("\n\n"))
}

/// Render a successful reply for `command`.
pub fn render_success(command: &BrowserCommand, payload: Value) -> ToolResult {
    let content = match command {
        BrowserCommand::GetTabs => render_tabs(&payload),
        BrowserCommand::Screenshot
        | BrowserCommand::GrabDom { .. }
        | BrowserCommand::CaptureWithHighlights { .. } => return passthrough(payload),
        BrowserCommand::Navigate { url, .. } => format!(
            "Successfully navigated to {}\n{}",
            url,
            action_line(&payload, "go_to_url", format!("Navigated to {}", url))
        ),
        BrowserCommand::SelectTab { tab_id } => format!(
            "Successfully switched to tab {}\n{}",
            tab_id,
            action_line(&payload, "select_tab", "Tab selected".into())
        ),
        BrowserCommand::NewTab { url } => {
            let id = field(&payload, "id")
                .map(display)
                .unwrap_or_else(|| "unknown".into());
            let action = action_line(&payload, "new_tab", "New tab created".into());
            match url {
                Some(url) => format!(
                    "Successfully created new tab (ID: {}) with URL: {}\n{}",
                    id, url, action
                ),
                None => format!("Successfully created new tab (ID: {})\n{}", id, action),
            }
        }
        BrowserCommand::CloseTab { tab_id } => format!(
            "Successfully closed tab {}\n{}",
            tab_label(tab_id),
            action_line(&payload, "close_tab", "Tab closed".into())
        ),
        BrowserCommand::SearchGoogle { query, .. } => format!(
            "Successfully searched Google for '{}'\n{}",
            query,
            action_line(&payload, "search_google", format!("Searched Google for {}", query))
        ),
        BrowserCommand::ClickElement { element_id, .. } => format!(
            "Successfully clicked element '{}'\n{}",
            element_id,
            action_line(
                &payload,
                "click_element",
                format!("Clicked element '{}'", element_id)
            )
        ),
        BrowserCommand::InputText {
            element_id, text, ..
        } => format!(
            "Successfully input text '{}' into element '{}'\n{}",
            text,
            element_id,
            action_line(
                &payload,
                "input_text",
                format!("Input text into element '{}'", element_id)
            )
        ),
        BrowserCommand::SendKeys { keys, .. } => format!(
            "Successfully sent keys '{}'\n{}",
            keys,
            action_line(&payload, "send_keys", format!("Sent keys '{}'", keys))
        ),
        BrowserCommand::AddAssistantMessage { message } => {
            format!("Successfully added assistant message: {}", message)
        }
    };

    if payload.is_null() {
        ToolResult::success(content)
    } else {
        ToolResult::success_json(content, payload)
    }
}

/// Leading sentence of the failure message for `command`.
pub fn failure_context(command: &BrowserCommand) -> String {
    match command {
        BrowserCommand::GetTabs => "Failed to get tabs".into(),
        BrowserCommand::Screenshot => "Failed to take screenshot".into(),
        BrowserCommand::Navigate { url, .. } => format!("Failed to navigate to {}", url),
        BrowserCommand::SelectTab { tab_id } => format!("Failed to select tab {}", tab_id),
        BrowserCommand::NewTab { .. } => "Failed to create new tab".into(),
        BrowserCommand::CloseTab { .. } => "Failed to close tab".into(),
        BrowserCommand::SearchGoogle { query, .. } => {
            format!("Failed to search Google for '{}'", query)
        }
        BrowserCommand::ClickElement { element_id, .. } => {
            format!("Failed to click element '{}'", element_id)
        }
        BrowserCommand::InputText { element_id, .. } => {
            format!("Failed to input text into element '{}'", element_id)
        }
        BrowserCommand::SendKeys { keys, .. } => format!("Failed to send keys '{}'", keys),
        BrowserCommand::GrabDom { .. } => "Failed to grab DOM".into(),
        BrowserCommand::CaptureWithHighlights { .. } => {
            "Failed to capture screenshot with highlights".into()
        }
        BrowserCommand::AddAssistantMessage { .. } => "Failed to add assistant message".into(),
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
