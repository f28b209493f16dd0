use super::*;
use dexbridge_bridge::CommandBridge;
use dexbridge_tools::{CallTimeouts, CatalogueOptions, default_registry};
use std::time::Duration;

fn handler_with(bridge: Arc<CommandBridge>) -> McpHandler {
    let options = CatalogueOptions {
        timeouts: CallTimeouts::default(),
        contents_path: "/nonexistent/contents.json".into(),
        analytics_path: std::env::temp_dir().join("dexbridge-mcp-analytics.json"),
    };
    let registry = Arc::new(default_registry(bridge, options).unwrap());
    McpHandler::new(registry, ServerInfo::default())
}

fn handler() -> McpHandler {
    handler_with(Arc::new(CommandBridge::new(Duration::from_secs(5))))
}

fn request(id: i64, method: &str, params: Value) -> McpRequest {
    McpRequest::new(id, method).with_params(params)
}

#[tokio::test]
async fn test_initialize_echoes_protocol_version() {
    let resp = handler()
        .handle(request(1, "initialize", json!({"protocolVersion": "2025-03-26"})))
        .await
        .unwrap();
    let result = resp.result.unwrap();
    assert_eq!(result["protocolVersion"], "2025-03-26");
    assert_eq!(result["serverInfo"]["name"], "dex-browser");
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_initialize_default_version() {
    let resp = handler()
        .handle(McpRequest::new(1, "initialize"))
        .await
        .unwrap();
    assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
}

#[tokio::test]
async fn test_notification_gets_no_response() {
    let resp = handler()
        .handle(McpRequest::notification("notifications/initialized"))
        .await;
    assert!(resp.is_none());
}

#[tokio::test]
async fn test_ping() {
    let resp = handler().handle(McpRequest::new("p", "ping")).await.unwrap();
    assert_eq!(resp.result, Some(json!({})));
}

#[tokio::test]
async fn test_tools_list() {
    let resp = handler().handle(McpRequest::new(2, "tools/list")).await.unwrap();
    let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 17);
    let navigate = tools.iter().find(|t| t["name"] == "navigate").unwrap();
    assert_eq!(navigate["inputSchema"]["required"], json!(["url"]));
}

#[tokio::test]
async fn test_unknown_method() {
    let resp = handler()
        .handle(McpRequest::new(3, "resources/list"))
        .await
        .unwrap();
    assert_eq!(resp.error.unwrap().code, -32601);
    assert_eq!(resp.id, Some(3.into()));
}

#[tokio::test]
async fn test_call_unknown_tool() {
    let resp = handler()
        .handle(request(4, "tools/call", json!({"name": "teleport", "arguments": {}})))
        .await
        .unwrap();
    let error = resp.error.unwrap();
    assert_eq!(error.code, -32602);
    assert!(error.message.contains("teleport"));
}

#[tokio::test]
async fn test_call_missing_argument_is_invalid_params() {
    let resp = handler()
        .handle(request(5, "tools/call", json!({"name": "navigate", "arguments": {}})))
        .await
        .unwrap();
    assert_eq!(resp.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_call_without_extension_is_tool_error() {
    let resp = handler()
        .handle(request(6, "tools/call", json!({"name": "get_tabs"})))
        .await
        .unwrap();
    let result = resp.result.unwrap();
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Failed to get tabs: "));
}

#[tokio::test]
async fn test_call_round_trip_through_bridge() {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let handler = Arc::new(handler_with(bridge.clone()));
    let mut link = bridge.attach().unwrap();

    let call = {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler
                .handle(request(
                    7,
                    "tools/call",
                    json!({"name": "select_tab", "arguments": {"tab_id": 2}}),
                ))
                .await
        })
    };
    let frame: Value = serde_json::from_str(&link.outbound.recv().await.unwrap()).unwrap();
    bridge.handle_frame(&json!({"id": frame["id"], "success": true}).to_string());

    let result = call.await.unwrap().unwrap().result.unwrap();
    assert_eq!(result["isError"], false);
    assert_eq!(
        result["content"][0]["text"],
        "Successfully switched to tab 2\nAction: select_tab - Tab selected"
    );
}

#[tokio::test]
async fn test_screenshot_becomes_image_content() {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let handler = Arc::new(handler_with(bridge.clone()));
    let mut link = bridge.attach().unwrap();

    let call = {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler
                .handle(request(8, "tools/call", json!({"name": "screenshot"})))
                .await
        })
    };
    let frame: Value = serde_json::from_str(&link.outbound.recv().await.unwrap()).unwrap();
    bridge.handle_frame(
        &json!({"id": frame["id"], "success": true, "data": {"screenshot": "data:image/png;base64,iVBOR"}})
            .to_string(),
    );

    let result = call.await.unwrap().unwrap().result.unwrap();
    assert_eq!(
        result["content"][0],
        json!({"type": "image", "data": "iVBOR", "mimeType": "image/png"})
    );
}

#[tokio::test]
async fn test_handle_text_errors() {
    let h = handler();
    let resp = h.handle_text("{not json").await.unwrap();
    assert_eq!(resp.error.unwrap().code, -32700);
    assert!(resp.id.is_none());

    let resp = h.handle_text(r#"{"jsonrpc": "2.0", "id": 1}"#).await.unwrap();
    assert_eq!(resp.error.unwrap().code, -32600);
}

#[test]
fn test_data_url() {
    assert_eq!(
        data_url("data:image/jpeg;base64,abc"),
        Some(("image/jpeg".to_string(), "abc".to_string()))
    );
    assert_eq!(data_url("data:text/plain;base64,abc"), None);
    assert_eq!(data_url("plain text"), None);
}
