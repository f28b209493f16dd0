use super::*;
use dexbridge_bridge::{BridgeError, PeerLink};
use serde_json::json;

fn cmd(kind: CommandKind, params: Value) -> BrowserCommand {
    BrowserCommand::parse(kind, &params).unwrap()
}

#[test]
fn test_render_tabs() {
    let payload = json!({"tabs": [
        {"id": 1, "title": "Rust", "url": "https://rust-lang.org"},
        {"id": 2, "title": ""}
    ]});
    let result = render_success(&BrowserCommand::GetTabs, payload);
    assert_eq!(
        result.content,
        "Found 2 open tabs:\n\nTab 1: Rust\n  URL: https://rust-lang.org\n\nTab 2: Untitled"
    );
    assert!(result.data.is_some());
}

#[test]
fn test_render_tabs_bare_array_and_empty() {
    let result = render_success(&BrowserCommand::GetTabs, json!([{"id": 5, "title": "X"}]));
    assert!(result.content.starts_with("Found 1 open tabs:"));

    let result = render_success(&BrowserCommand::GetTabs, json!({"tabs": []}));
    assert_eq!(result.content, "No open tabs found.");

    let result = render_success(&BrowserCommand::GetTabs, Value::Null);
    assert_eq!(result.content, "No tabs found or unable to fetch tabs.");
}

#[test]
fn test_render_navigate_defaults() {
    let command = cmd(CommandKind::Navigate, json!({"url": "https://example.com"}));
    let result = render_success(&command, Value::Null);
    assert_eq!(
        result.content,
        "Successfully navigated to https://example.com\nAction: go_to_url - Navigated to https://example.com"
    );
}

#[test]
fn test_render_uses_reply_action_and_message() {
    let command = cmd(CommandKind::SelectTab, json!({"tab_id": 3}));
    let result = render_success(
        &command,
        json!({"action": "switch_tab", "message": "Now on tab 3"}),
    );
    assert_eq!(
        result.content,
        "Successfully switched to tab 3\nAction: switch_tab - Now on tab 3"
    );
}

#[test]
fn test_render_new_tab() {
    let command = cmd(CommandKind::NewTab, json!({"url": "https://docs.rs"}));
    let result = render_success(&command, json!({"id": 42}));
    assert_eq!(
        result.content,
        "Successfully created new tab (ID: 42) with URL: https://docs.rs\nAction: new_tab - New tab created"
    );

    let command = cmd(CommandKind::NewTab, json!({}));
    let result = render_success(&command, json!({"data": {"id": 7}}));
    assert!(result.content.starts_with("Successfully created new tab (ID: 7)\n"));
}

#[test]
fn test_render_close_active_tab() {
    let command = cmd(CommandKind::CloseTab, json!({}));
    let result = render_success(&command, Value::Null);
    assert_eq!(
        result.content,
        "Successfully closed tab (active)\nAction: close_tab - Tab closed"
    );
}

#[test]
fn test_render_interaction_tools() {
    let result = render_success(
        &cmd(CommandKind::InputText, json!({"element_id": "q", "text": "tokio"})),
        Value::Null,
    );
    assert_eq!(
        result.content,
        "Successfully input text 'tokio' into element 'q'\nAction: input_text - Input text into element 'q'"
    );

    let result = render_success(&cmd(CommandKind::SendKeys, json!({"keys": "Enter"})), Value::Null);
    assert_eq!(
        result.content,
        "Successfully sent keys 'Enter'\nAction: send_keys - Sent keys 'Enter'"
    );

    let result = render_success(
        &cmd(CommandKind::AddAssistantMessage, json!({"message": "Done"})),
        Value::Null,
    );
    assert_eq!(result.content, "Successfully added assistant message: Done");
}

#[test]
fn test_passthrough_payloads() {
    let result = render_success(&BrowserCommand::Screenshot, json!("data:image/png;base64,AAAA"));
    assert_eq!(result.content, "data:image/png;base64,AAAA");

    let dom = json!({"dom": "<html/>", "xpaths": {"1": "/html"}});
    let result = render_success(&BrowserCommand::GrabDom { tab_id: None }, dom.clone());
    assert_eq!(result.data, Some(dom));
}

#[test]
fn test_failure_context() {
    let command = cmd(CommandKind::SearchGoogle, json!({"query": "axum"}));
    let err = ToolError::bridge(failure_context(&command), BridgeError::Remote("blocked".into()));
    assert_eq!(err.to_string(), "Failed to search Google for 'axum': blocked");
}

#[test]
fn test_timeouts_for_kind() {
    let timeouts = CallTimeouts {
        default: Duration::from_secs(1),
        slow: Duration::from_secs(9),
    };
    assert_eq!(timeouts.for_kind(CommandKind::Screenshot), Duration::from_secs(9));
    assert_eq!(timeouts.for_kind(CommandKind::GetTabs), Duration::from_secs(1));
}

async fn answer_next(link: &mut PeerLink, bridge: &CommandBridge, data: Value) -> Value {
    let text = link.outbound.recv().await.unwrap();
    let frame: Value = serde_json::from_str(&text).unwrap();
    bridge.handle_frame(&json!({"id": frame["id"], "success": true, "data": data}).to_string());
    frame
}

#[tokio::test]
async fn test_execute_forwards_to_bridge() {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let mut link = bridge.attach().unwrap();
    let tool = BrowserTool::new(CommandKind::NavigateTab, bridge.clone(), CallTimeouts::default());

    let call = tokio::spawn(async move {
        tool.execute(
            json!({"url": "https://crates.io", "tab_id": 3}),
            ToolContext::new("test"),
        )
        .await
    });
    let frame = answer_next(&mut link, &bridge, json!({"message": "Loaded"})).await;
    assert_eq!(frame["method"], "navigate");
    assert_eq!(frame["params"], json!({"url": "https://crates.io", "tab_id": 3}));

    let result = call.await.unwrap().unwrap();
    assert_eq!(
        result.content,
        "Successfully navigated to https://crates.io\nAction: go_to_url - Loaded"
    );
}

#[tokio::test]
async fn test_execute_not_connected() {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let tool = BrowserTool::new(CommandKind::GetTabs, bridge, CallTimeouts::default());

    let err = tool.execute(json!({}), ToolContext::new("test")).await.unwrap_err();
    assert_eq!(err.bridge_error(), Some(&BridgeError::NotConnected));
    assert!(err.to_string().starts_with("Failed to get tabs: "));
}

#[tokio::test]
async fn test_execute_rejects_missing_url_before_bridge() {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let mut link = bridge.attach().unwrap();
    let tool = BrowserTool::new(CommandKind::Navigate, bridge, CallTimeouts::default());

    let err = tool.execute(json!({}), ToolContext::new("test")).await.unwrap_err();
    assert!(matches!(err, ToolError::ValidationFailed(_)));
    assert!(link.outbound.try_recv().is_err());
}
