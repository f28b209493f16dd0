//! End-to-end tests against a real socket with a stub extension.

use std::sync::Arc;
use std::time::Duration;

use dexbridge_bridge::{BridgeError, CommandBridge, ConnectionEndpoint};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

type Peer = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct Harness {
    bridge: Arc<CommandBridge>,
    url: String,
    shutdown: CancellationToken,
    server: tokio::task::JoinHandle<std::io::Result<()>>,
}

async fn start() -> Harness {
    let bridge = Arc::new(CommandBridge::new(Duration::from_secs(5)));
    let endpoint = ConnectionEndpoint::new(bridge.clone(), "/", Duration::from_millis(50));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(endpoint.serve(listener, shutdown.clone()));
    Harness {
        bridge,
        url,
        shutdown,
        server,
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

async fn connect(harness: &Harness) -> Peer {
    let before = harness.bridge.generation();
    let (peer, _) = connect_async(harness.url.as_str()).await.unwrap();
    let bridge = harness.bridge.clone();
    wait_for(|| bridge.generation().is_some() && bridge.generation() != before).await;
    peer
}

async fn next_request(peer: &mut Peer) -> Value {
    loop {
        match peer.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("peer stream ended: {other:?}"),
        }
    }
}

/// Echo `params` back as `data` for every request.
fn spawn_echo(mut peer: Peer) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(Ok(msg)) = peer.next().await {
            let Message::Text(text) = msg else { continue };
            let request: Value = serde_json::from_str(text.as_str()).unwrap();
            let reply = json!({"id": request["id"], "success": true, "data": request["params"]});
            if peer.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    })
}

#[tokio::test]
async fn test_echo_over_socket() {
    let harness = start().await;
    let peer = connect(&harness).await;
    let _echo = spawn_echo(peer);

    let result = harness.bridge.call("echo", json!({"x": 1})).await.unwrap();
    assert_eq!(result, json!({"x": 1}));

    harness.shutdown.cancel();
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_echo_many_concurrent_calls() {
    let harness = start().await;
    let _echo = spawn_echo(connect(&harness).await);

    let calls: Vec<_> = (0..20)
        .map(|n| {
            let bridge = harness.bridge.clone();
            tokio::spawn(async move { (n, bridge.call("echo", json!({ "n": n })).await) })
        })
        .collect();
    for call in calls {
        let (n, result) = call.await.unwrap();
        assert_eq!(result.unwrap(), json!({ "n": n }));
    }
    assert_eq!(harness.bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_peer_disconnect_fails_outstanding_call() {
    let harness = start().await;
    let mut peer = connect(&harness).await;

    let call = {
        let bridge = harness.bridge.clone();
        tokio::spawn(async move { bridge.call("grab_dom", json!({})).await })
    };
    next_request(&mut peer).await;
    peer.close(None).await.unwrap();
    drop(peer);

    assert_eq!(call.await.unwrap().unwrap_err(), BridgeError::ConnectionLost);
    let bridge = harness.bridge.clone();
    wait_for(|| !bridge.is_connected()).await;
}

#[tokio::test]
async fn test_new_connection_replaces_old() {
    let harness = start().await;
    let mut first = connect(&harness).await;

    let call_a = {
        let bridge = harness.bridge.clone();
        tokio::spawn(async move { bridge.call("navigate", json!({"url": "a"})).await })
    };
    next_request(&mut first).await;

    let second = connect(&harness).await;
    assert_eq!(call_a.await.unwrap().unwrap_err(), BridgeError::ConnectionLost);

    // The old socket gets a close frame (or simply ends).
    loop {
        match first.next().await {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }

    let _echo = spawn_echo(second);
    let result = harness.bridge.call("navigate", json!({"url": "b"})).await.unwrap();
    assert_eq!(result, json!({"url": "b"}));
}

#[tokio::test]
async fn test_remote_error_and_garbage_frames() {
    let harness = start().await;
    let mut peer = connect(&harness).await;

    let call = {
        let bridge = harness.bridge.clone();
        tokio::spawn(async move { bridge.call("select_tab", json!({"tab_id": 3})).await })
    };
    let request = next_request(&mut peer).await;

    peer.send(Message::Text("not json".into())).await.unwrap();
    let reply = json!({"id": request["id"], "success": false, "error": "No tab with id: 3"});
    peer.send(Message::Text(reply.to_string().into())).await.unwrap();

    assert_eq!(
        call.await.unwrap().unwrap_err(),
        BridgeError::Remote("No tab with id: 3".into())
    );
}

#[tokio::test]
async fn test_shutdown_closes_connection() {
    let harness = start().await;
    let mut peer = connect(&harness).await;

    harness.bridge.begin_shutdown();
    harness.shutdown.cancel();

    loop {
        match peer.next().await {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }
    tokio::time::timeout(Duration::from_secs(5), harness.server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(!harness.bridge.is_connected());
}
