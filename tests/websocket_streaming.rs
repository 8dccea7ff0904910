//! End-to-end tests for live viewers over a real WebSocket connection.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{eventually, spawn_app, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, session_id: &str) -> Client {
    let url = format!("ws://{}/ws/consume-sessions/{}", addr, session_id);
    let (client, _) = connect_async(url).await.unwrap();
    client
}

/// Next text or close frame, skipping pings.
async fn next_frame(client: &mut Client) -> Message {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no frame within timeout")
            .expect("stream ended")
            .unwrap();
        match frame {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

async fn wait_for_subscribers(app: &TestApp, session_id: &str, count: u64) {
    let uri = format!("/api/consume-sessions/{}", session_id);
    let uri = uri.as_str();
    assert!(
        eventually(|| async move {
            let (_, status) = app.get(uri).await;
            status["data"]["subscriberCount"] == count
        })
        .await,
        "subscriber count never reached {}",
        count
    );
}

#[tokio::test]
async fn viewer_receives_records_then_normal_close_on_stop() {
    let app = spawn_app();
    let addr = serve(&app).await;
    let id = app.start_session(json!({"topic": "orders"})).await;

    let mut client = connect(addr, &id).await;
    wait_for_subscribers(&app, &id, 1).await;

    app.produce("orders", &["{\"total\":42}"]).await;

    let record: Value = match next_frame(&mut client).await {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    };
    assert_eq!(record["topic"], "orders");
    assert_eq!(record["offset"], 0);
    assert_eq!(record["value"], "{\"total\":42}");

    let (status, _) = app.delete(&format!("/api/consume-sessions/{}", id)).await;
    assert!(status.is_success());

    match next_frame(&mut client).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Normal);
            assert_eq!(frame.reason, "Consume session stopped");
        }
        other => panic!("expected close frame, got {:?}", other),
    }
}

#[tokio::test]
async fn every_viewer_sees_each_record() {
    let app = spawn_app();
    let addr = serve(&app).await;
    let id = app
        .start_session(json!({"topic": "orders", "from": "EARLIEST"}))
        .await;

    let mut first = connect(addr, &id).await;
    let mut second = connect(addr, &id).await;
    wait_for_subscribers(&app, &id, 2).await;

    app.produce("orders", &["hello"]).await;

    for client in [&mut first, &mut second] {
        match next_frame(client).await {
            Message::Text(text) => {
                let record: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(record["value"], "hello");
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn disconnecting_viewer_is_unsubscribed() {
    let app = spawn_app();
    let addr = serve(&app).await;
    let id = app.start_session(json!({"topic": "orders"})).await;

    let mut client = connect(addr, &id).await;
    wait_for_subscribers(&app, &id, 1).await;

    client.close(None).await.unwrap();
    wait_for_subscribers(&app, &id, 0).await;
}

#[tokio::test]
async fn unknown_session_is_closed_with_policy_violation() {
    let app = spawn_app();
    let addr = serve(&app).await;

    let mut client = connect(addr, "sess_missing").await;

    match next_frame(&mut client).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Policy),
        other => panic!("expected close frame, got {:?}", other),
    }
}

#[tokio::test]
async fn stopped_session_refuses_viewers() {
    let app = spawn_app();
    let addr = serve(&app).await;
    let id = app.start_session(json!({"topic": "orders"})).await;
    app.delete(&format!("/api/consume-sessions/{}", id)).await;

    let mut client = connect(addr, &id).await;

    match next_frame(&mut client).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Policy),
        other => panic!("expected close frame, got {:?}", other),
    }
}
