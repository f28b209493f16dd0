use super::*;
use crate::handler::ServerInfo;
use axum::body::Body;
use axum::http::Request;
use dexbridge_bridge::CommandBridge;
use dexbridge_tools::{CallTimeouts, CatalogueOptions, default_registry};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

fn server() -> McpServer {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let options = CatalogueOptions {
        timeouts: CallTimeouts::default(),
        contents_path: "/nonexistent/contents.json".into(),
        analytics_path: std::env::temp_dir().join("dexbridge-mcp-server-analytics.json"),
    };
    let registry = Arc::new(default_registry(bridge, options).unwrap());
    McpServer::new(Arc::new(McpHandler::new(registry, ServerInfo::default())))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read SSE chunks until a complete event named `name` arrives.
async fn read_event<S>(stream: &mut S, name: &str) -> String
where
    S: Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let mut buf = String::new();
    loop {
        while let Some(end) = buf.find("\n\n") {
            let block: String = buf.drain(..end + 2).collect();
            let named = block
                .lines()
                .any(|l| l.strip_prefix("event:").map(str::trim) == Some(name));
            if named {
                return block;
            }
        }
        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("event in time")
            .expect("stream open")
            .unwrap();
        buf.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

fn event_data(event: &str) -> String {
    event
        .lines()
        .filter_map(|l| l.strip_prefix("data: ").or_else(|| l.strip_prefix("data:")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_rpc_tools_list() {
    let app = server().router();
    let response = app
        .oneshot(post("/mcp", json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert!(body["result"]["tools"].as_array().unwrap().len() > 10);
}

#[tokio::test]
async fn test_rpc_notification_is_accepted() {
    let app = server().router();
    let response = app
        .oneshot(post(
            "/mcp",
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_rpc_parse_error() {
    let app = server().router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_messages_unknown_session() {
    let app = server().router();
    let response = app
        .oneshot(post(
            "/messages/?session_id=nope",
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sse_session_flow() {
    let server = server();
    let response = server
        .router()
        .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut events = response.into_body().into_data_stream();
    let endpoint = read_event(&mut events, "endpoint").await;
    let path = event_data(&endpoint);
    assert!(path.starts_with("/messages/?session_id="));
    assert_eq!(server.sessions().len(), 1);

    let accepted = server
        .router()
        .oneshot(post(&path, json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);

    let message = read_event(&mut events, "message").await;
    let reply: Value = serde_json::from_str(&event_data(&message)).unwrap();
    assert_eq!(reply["id"], 9);
    assert_eq!(reply["result"], json!({}));

    drop(events);
    assert!(server.sessions().is_empty());
}

#[tokio::test]
async fn test_bind_with_fallback_skips_taken_port() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    match bind_with_fallback("127.0.0.1", port, 5).await {
        Ok(listener) => assert_ne!(listener.local_addr().unwrap().port(), port),
        // Neighbouring ports may all be taken on a busy host.
        Err(e) => assert_eq!(e.kind(), io::ErrorKind::AddrInUse),
    }
    let err = bind_with_fallback("127.0.0.1", port, 1).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
}
