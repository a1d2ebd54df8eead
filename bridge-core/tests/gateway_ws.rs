//! Integration tests that drive the gateway over a real WebSocket.

use aura_bridge_core::gateway::{gateway_router, GatewayConfig, GatewayServer, SharedGateway};
use aura_bridge_core::{DryRunInjector, KeyCommand, QuestionPayload};
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_gateway(max_connections: usize) -> (SharedGateway, Arc<DryRunInjector>, String) {
    let injector = Arc::new(DryRunInjector::new());
    let config = GatewayConfig {
        max_connections,
        ..GatewayConfig::default()
    };
    let gw = GatewayServer::new(config, injector.clone()).into_shared();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = gateway_router(gw.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (gw, injector, format!("ws://{}/ws", addr))
}

async fn connect(url: &str) -> Client {
    let (ws, _resp) = connect_async(url).await.expect("handshake ok");
    ws
}

async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn send_action(ws: &mut Client, content: &str) {
    let frame = json!({"type": "action", "content": content}).to_string();
    send_text(ws, &frame).await;
}

/// Next data frame as JSON, skipping control frames.
async fn recv_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("reply within timeout")
            .expect("stream open")
            .expect("frame ok");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text frame, got {:?}", other),
        }
    }
}

fn languages() -> QuestionPayload {
    QuestionPayload {
        text: "Which language?".into(),
        options: vec![
            "Python".into(),
            "JavaScript".into(),
            "Rust".into(),
            "Go".into(),
        ],
    }
}

/// Round-trips one frame so the server has registered the session.
async fn wait_registered(ws: &mut Client) {
    send_action(ws, "1").await;
    let reply = recv_json(ws).await;
    assert_eq!(
        reply,
        json!({"type": "error", "content": "No pending question to answer"})
    );
}

#[tokio::test]
async fn test_pushed_question_then_answer() {
    let (gw, injector, url) = start_gateway(4).await;
    let mut ws = connect(&url).await;
    wait_registered(&mut ws).await;

    let delivered = gw.lock().await.broadcast_question(&languages()).unwrap();
    assert_eq!(delivered, 1);
    let pushed = recv_json(&mut ws).await;
    assert_eq!(pushed["type"], "response");
    assert_eq!(pushed["content"]["text"], "Which language?");

    send_action(&mut ws, "three").await;
    assert_eq!(
        recv_json(&mut ws).await,
        json!({"type": "confirmation", "content": "Selected option 3: Rust"})
    );
    assert_eq!(
        injector.history(),
        vec![KeyCommand::Select { down_presses: 2 }]
    );
}

#[tokio::test]
async fn test_replies_follow_arrival_order() {
    let (gw, injector, url) = start_gateway(4).await;
    let mut ws = connect(&url).await;
    wait_registered(&mut ws).await;
    gw.lock().await.broadcast_question(&languages()).unwrap();
    recv_json(&mut ws).await;

    // Sent back to back without waiting for replies.
    send_action(&mut ws, "banana").await;
    send_action(&mut ws, "9").await;
    send_action(&mut ws, "2").await;
    send_action(&mut ws, "4").await;

    let first = recv_json(&mut ws).await;
    assert_eq!(first["type"], "response");
    assert!(first["content"]["text"]
        .as_str()
        .unwrap()
        .contains("you entered 'banana'"));

    let second = recv_json(&mut ws).await;
    assert_eq!(second["type"], "response");
    assert!(second["content"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Option 9 is out of range (1-4)"));

    assert_eq!(
        recv_json(&mut ws).await,
        json!({"type": "confirmation", "content": "Selected option 2: JavaScript"})
    );
    assert_eq!(
        recv_json(&mut ws).await,
        json!({"type": "error", "content": "No pending question to answer"})
    );
    assert_eq!(
        injector.history(),
        vec![KeyCommand::Select { down_presses: 1 }]
    );
}

#[tokio::test]
async fn test_invalid_frame_gets_error_and_socket_stays_open() {
    let (_gw, _injector, url) = start_gateway(4).await;
    let mut ws = connect(&url).await;

    send_text(&mut ws, "not json").await;
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["content"]
        .as_str()
        .unwrap()
        .starts_with("Invalid message"));

    send_text(&mut ws, r#"{"type": "dance", "content": "x"}"#).await;
    assert_eq!(recv_json(&mut ws).await["type"], "error");

    // Still serving after the bad frames.
    wait_registered(&mut ws).await;
}

#[tokio::test]
async fn test_binary_frames_are_answered() {
    let (_gw, _injector, url) = start_gateway(4).await;
    let mut ws = connect(&url).await;

    let frame = json!({"type": "action", "content": "1"}).to_string();
    ws.send(Message::Binary(frame.into_bytes().into()))
        .await
        .unwrap();
    assert_eq!(
        recv_json(&mut ws).await,
        json!({"type": "error", "content": "No pending question to answer"})
    );

    ws.send(Message::Binary(vec![0xff, 0xfe, 0x00].into()))
        .await
        .unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["content"]
        .as_str()
        .unwrap()
        .contains("not valid UTF-8"));
}

#[tokio::test]
async fn test_over_capacity_gets_error_then_close() {
    let (gw, _injector, url) = start_gateway(1).await;
    let mut first = connect(&url).await;
    wait_registered(&mut first).await;

    let mut second = connect(&url).await;
    assert_eq!(
        recv_json(&mut second).await,
        json!({"type": "error", "content": "Server at maximum connections"})
    );
    let next = tokio::time::timeout(RECV_TIMEOUT, second.next())
        .await
        .expect("socket closes within timeout");
    assert!(
        matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))),
        "Expected close, got {:?}",
        next
    );

    assert_eq!(gw.lock().await.active_connections(), 1);
    // The accepted client is unaffected.
    wait_registered(&mut first).await;
}

#[tokio::test]
async fn test_disconnect_ends_session() {
    let (gw, _injector, url) = start_gateway(4).await;
    let mut ws = connect(&url).await;
    wait_registered(&mut ws).await;
    assert_eq!(gw.lock().await.active_sessions(), 1);

    ws.close(None).await.unwrap();
    drop(ws);

    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    loop {
        let (sessions, connections) = {
            let gw = gw.lock().await;
            (gw.active_sessions(), gw.active_connections())
        };
        if sessions == 0 && connections == 0 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "session not cleaned up"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
