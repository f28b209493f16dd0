//! Typed browser commands.
//!
//! Each variant maps to exactly one wire method. Parameters are checked when
//! the command is built, so nothing malformed reaches the bridge.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ToolError;
use crate::tool::ToolDefinition;

/// Browser tools, one per advertised tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetTabs,
    Screenshot,
    Navigate,
    NavigateTab,
    SelectTab,
    NewTab,
    CloseTab,
    SearchGoogle,
    ClickElement,
    InputText,
    SendKeys,
    GrabDom,
    CaptureWithHighlights,
    AddAssistantMessage,
}

impl CommandKind {
    pub const ALL: &'static [CommandKind] = &[
        CommandKind::GetTabs,
        CommandKind::Screenshot,
        CommandKind::Navigate,
        CommandKind::NavigateTab,
        CommandKind::SelectTab,
        CommandKind::NewTab,
        CommandKind::CloseTab,
        CommandKind::SearchGoogle,
        CommandKind::ClickElement,
        CommandKind::InputText,
        CommandKind::SendKeys,
        CommandKind::GrabDom,
        CommandKind::CaptureWithHighlights,
        CommandKind::AddAssistantMessage,
    ];

    /// Advertised tool name.
    pub fn tool_name(self) -> &'static str {
        match self {
            CommandKind::GetTabs => "get_tabs",
            CommandKind::Screenshot => "screenshot",
            CommandKind::Navigate => "navigate",
            CommandKind::NavigateTab => "navigate_tab",
            CommandKind::SelectTab => "select_tab",
            CommandKind::NewTab => "new_tab",
            CommandKind::CloseTab => "close_tab",
            CommandKind::SearchGoogle => "search_google",
            CommandKind::ClickElement => "click_element",
            CommandKind::InputText => "input_text",
            CommandKind::SendKeys => "send_keys",
            CommandKind::GrabDom => "grab_dom",
            CommandKind::CaptureWithHighlights => "capture_with_highlights",
            CommandKind::AddAssistantMessage => "add_assistant_message",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.tool_name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            CommandKind::GetTabs => "Get all open browser tabs.",
            CommandKind::Screenshot => "Take a screenshot of the active tab.",
            CommandKind::Navigate => "Navigate to a URL in the active tab or a specified tab.",
            CommandKind::NavigateTab => "Navigate to a URL in a specific tab.",
            CommandKind::SelectTab => "Switch to a specific browser tab by ID.",
            CommandKind::NewTab => "Create a new browser tab, optionally with a specific URL.",
            CommandKind::CloseTab => {
                "Close a browser tab by ID, or the active tab if no ID is given."
            }
            CommandKind::SearchGoogle => "Perform a Google search in the active or specified tab.",
            CommandKind::ClickElement => "Click on a DOM element by its ID.",
            CommandKind::InputText => "Type text into a DOM element by its ID.",
            CommandKind::SendKeys => {
                "Send keyboard shortcuts or key combinations (e.g. 'Ctrl+C', 'Enter') to the page."
            }
            CommandKind::GrabDom => "Get the formatted DOM structure with XPath mappings for elements.",
            CommandKind::CaptureWithHighlights => {
                "Take a screenshot with element highlights for better page understanding."
            }
            CommandKind::AddAssistantMessage => "Add an assistant message to the chat.",
        }
    }

    fn schema(self) -> Value {
        let tab_id = json!({"type": "integer", "description": "Tab ID, defaults to the active tab"});
        let (properties, required): (Value, Vec<&str>) = match self {
            CommandKind::GetTabs | CommandKind::Screenshot => (json!({}), vec![]),
            CommandKind::Navigate => (
                json!({"url": {"type": "string", "description": "URL to navigate to"}, "tab_id": tab_id}),
                vec!["url"],
            ),
            CommandKind::NavigateTab => (
                json!({"url": {"type": "string", "description": "URL to navigate to"}, "tab_id": {"type": "integer"}}),
                vec!["url", "tab_id"],
            ),
            CommandKind::SelectTab => (json!({"tab_id": {"type": "integer"}}), vec!["tab_id"]),
            CommandKind::NewTab => (
                json!({"url": {"type": "string", "description": "URL to open, defaults to a blank tab"}}),
                vec![],
            ),
            CommandKind::CloseTab | CommandKind::GrabDom | CommandKind::CaptureWithHighlights => {
                (json!({ "tab_id": tab_id }), vec![])
            }
            CommandKind::SearchGoogle => (
                json!({"query": {"type": "string", "description": "Search query text"}, "tab_id": tab_id}),
                vec!["query"],
            ),
            CommandKind::ClickElement => (
                json!({"element_id": {"type": "string"}, "tab_id": tab_id}),
                vec!["element_id"],
            ),
            CommandKind::InputText => (
                json!({"element_id": {"type": "string"}, "text": {"type": "string"}, "tab_id": tab_id}),
                vec!["element_id", "text"],
            ),
            CommandKind::SendKeys => (
                json!({"keys": {"type": "string", "description": "Key combination"}, "tab_id": tab_id}),
                vec!["keys"],
            ),
            CommandKind::AddAssistantMessage => (
                json!({"message": {"type": "string"}}),
                vec!["message"],
            ),
        };
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition::new(self.tool_name(), self.description())
            .with_parameters_schema(self.schema())
    }

    /// Commands whose reply carries page captures and takes longer.
    pub fn is_slow(self) -> bool {
        matches!(
            self,
            CommandKind::Screenshot | CommandKind::GrabDom | CommandKind::CaptureWithHighlights
        )
    }
}

pub type TabId = i64;

/// A validated browser command.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserCommand {
    GetTabs,
    Screenshot,
    Navigate { url: String, tab_id: Option<TabId> },
    SelectTab { tab_id: TabId },
    NewTab { url: Option<String> },
    CloseTab { tab_id: Option<TabId> },
    SearchGoogle { query: String, tab_id: Option<TabId> },
    ClickElement { element_id: String, tab_id: Option<TabId> },
    InputText { element_id: String, text: String, tab_id: Option<TabId> },
    SendKeys { keys: String, tab_id: Option<TabId> },
    GrabDom { tab_id: Option<TabId> },
    CaptureWithHighlights { tab_id: Option<TabId> },
    AddAssistantMessage { message: String },
}

#[derive(Debug, Default, Deserialize)]
struct RawParams {
    url: Option<String>,
    tab_id: Option<TabId>,
    query: Option<String>,
    element_id: Option<String>,
    text: Option<String>,
    keys: Option<String>,
    message: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ToolError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ToolError::ValidationFailed(format!(
            "{} parameter is required",
            name
        ))),
    }
}

/// Like [`required`] but accepts an empty string, e.g. to clear a field.
fn present(value: Option<String>, name: &str) -> Result<String, ToolError> {
    value.ok_or_else(|| ToolError::ValidationFailed(format!("{} parameter is required", name)))
}

fn required_tab(value: Option<TabId>) -> Result<TabId, ToolError> {
    value.ok_or_else(|| ToolError::ValidationFailed("tab_id parameter is required".into()))
}

impl BrowserCommand {
    /// Build the command for `kind` from caller parameters.
    pub fn parse(kind: CommandKind, params: &Value) -> Result<Self, ToolError> {
        let raw: RawParams = if params.is_null() {
            RawParams::default()
        } else {
            serde_json::from_value(params.clone())
                .map_err(|e| ToolError::ValidationFailed(format!("Invalid params: {}", e)))?
        };

        let command = match kind {
            CommandKind::GetTabs => BrowserCommand::GetTabs,
            CommandKind::Screenshot => BrowserCommand::Screenshot,
            CommandKind::Navigate => BrowserCommand::Navigate {
                url: required(raw.url, "url")?,
                tab_id: raw.tab_id,
            },
            CommandKind::NavigateTab => BrowserCommand::Navigate {
                url: required(raw.url, "url")?,
                tab_id: Some(required_tab(raw.tab_id)?),
            },
            CommandKind::SelectTab => BrowserCommand::SelectTab {
                tab_id: required_tab(raw.tab_id)?,
            },
            CommandKind::NewTab => BrowserCommand::NewTab {
                url: raw.url.filter(|u| !u.trim().is_empty()),
            },
            CommandKind::CloseTab => BrowserCommand::CloseTab { tab_id: raw.tab_id },
            CommandKind::SearchGoogle => BrowserCommand::SearchGoogle {
                query: required(raw.query, "query")?,
                tab_id: raw.tab_id,
            },
            CommandKind::ClickElement => BrowserCommand::ClickElement {
                element_id: required(raw.element_id, "element_id")?,
                tab_id: raw.tab_id,
            },
            CommandKind::InputText => BrowserCommand::InputText {
                element_id: required(raw.element_id, "element_id")?,
                text: present(raw.text, "text")?,
                tab_id: raw.tab_id,
            },
            CommandKind::SendKeys => BrowserCommand::SendKeys {
                keys: required(raw.keys, "keys")?,
                tab_id: raw.tab_id,
            },
            CommandKind::GrabDom => BrowserCommand::GrabDom { tab_id: raw.tab_id },
            CommandKind::CaptureWithHighlights => {
                BrowserCommand::CaptureWithHighlights { tab_id: raw.tab_id }
            }
            CommandKind::AddAssistantMessage => BrowserCommand::AddAssistantMessage {
                message: required(raw.message, "message")?,
            },
        };
        Ok(command)
    }

    /// Wire method name.
    pub fn method(&self) -> &'static str {
        match self {
            BrowserCommand::GetTabs => "get_tabs",
            BrowserCommand::Screenshot => "screenshot",
            BrowserCommand::Navigate { .. } => "navigate",
            BrowserCommand::SelectTab { .. } => "select_tab",
            BrowserCommand::NewTab { .. } => "new_tab",
            BrowserCommand::CloseTab { .. } => "close_tab",
            BrowserCommand::SearchGoogle { .. } => "search_google",
            BrowserCommand::ClickElement { .. } => "click_element",
            BrowserCommand::InputText { .. } => "input_text",
            BrowserCommand::SendKeys { .. } => "send_keys",
            BrowserCommand::GrabDom { .. } => "grab_dom",
            BrowserCommand::CaptureWithHighlights { .. } => "capture_with_highlights",
            BrowserCommand::AddAssistantMessage { .. } => "add_assistant_message",
        }
    }

    /// Wire params. Absent optional values are omitted.
    pub fn params(&self) -> Value {
        let mut p = Map::new();
        let tab = |p: &mut Map<String, Value>, tab_id: &Option<TabId>| {
            if let Some(id) = tab_id {
                p.insert("tab_id".into(), json!(id));
            }
        };

        match self {
            BrowserCommand::GetTabs | BrowserCommand::Screenshot => {}
            BrowserCommand::Navigate { url, tab_id } => {
                p.insert("url".into(), json!(url));
                tab(&mut p, tab_id);
            }
            BrowserCommand::SelectTab { tab_id } => {
                p.insert("tab_id".into(), json!(tab_id));
            }
            BrowserCommand::NewTab { url } => {
                if let Some(url) = url {
                    p.insert("url".into(), json!(url));
                }
            }
            BrowserCommand::CloseTab { tab_id }
            | BrowserCommand::GrabDom { tab_id }
            | BrowserCommand::CaptureWithHighlights { tab_id } => tab(&mut p, tab_id),
            BrowserCommand::SearchGoogle { query, tab_id } => {
                p.insert("query".into(), json!(query));
                tab(&mut p, tab_id);
            }
            BrowserCommand::ClickElement { element_id, tab_id } => {
                p.insert("element_id".into(), json!(element_id));
                tab(&mut p, tab_id);
            }
            BrowserCommand::InputText {
                element_id,
                text,
                tab_id,
            } => {
                p.insert("element_id".into(), json!(element_id));
                p.insert("text".into(), json!(text));
                tab(&mut p, tab_id);
            }
            BrowserCommand::SendKeys { keys, tab_id } => {
                p.insert("keys".into(), json!(keys));
                tab(&mut p, tab_id);
            }
            BrowserCommand::AddAssistantMessage { message } => {
                p.insert("message".into(), json!(message));
            }
        }
        Value::Object(p)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
