//! Integration tests for the consume-session REST endpoints.
//!
//! Drives the full router with `tower::ServiceExt::oneshot` while the
//! consumption engine reads from the in-memory log.

mod common;

use http::StatusCode;
use serde_json::{json, Value};

use kafka_observatory::domain::foundation::SessionId;
use kafka_observatory::ports::BackendError;

use common::{eventually, spawn_app};

fn offsets(messages: &Value) -> Vec<i64> {
    messages["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["offset"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn buffer_keeps_only_the_newest_records() {
    let app = &spawn_app();
    app.log.create_topic("orders", 1);
    let values: Vec<String> = (0..10).map(|i| format!("order-{}", i)).collect();
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    app.produce("orders", &values).await;

    let id = app
        .start_session(json!({"topic": "orders", "from": "earliest", "maxBufferSize": 5}))
        .await;

    let status_uri = format!("/api/consume-sessions/{}", id);
    let status_uri = status_uri.as_str();
    assert!(
        eventually(|| async move {
            let (_, status) = app.get(status_uri).await;
            status["data"]["bufferSize"] == 5 && status["data"]["lastConsumedAt"] != Value::Null
        })
        .await,
        "buffer never filled"
    );

    let (status, messages) = app
        .get(&format!("/api/consume-sessions/{}/messages?limit=3", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(offsets(&messages), vec![9, 8, 7]);

    let (_, all) = app
        .get(&format!("/api/consume-sessions/{}/messages", id))
        .await;
    assert_eq!(offsets(&all), vec![9, 8, 7, 6, 5]);
    assert_eq!(all["data"][0]["value"], "order-9");
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let app = &spawn_app();
    let id = app.start_session(json!({"topic": "orders"})).await;
    let base = format!("/api/consume-sessions/{}", id);

    let (status, body) = app.get(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "RUNNING");
    assert_eq!(body["data"]["topic"], "orders");
    assert_eq!(body["data"]["subscriberCount"], 0);

    let (status, body) = app.post_empty(&format!("{}/pause", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "PAUSED");

    let (status, body) = app.post_empty(&format!("{}/resume", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "RUNNING");

    let (status, body) = app.delete(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "STOPPED");

    let (status, body) = app.post_empty(&format!("{}/resume", base)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");

    // Stopping twice keeps the session stopped.
    let (status, body) = app.delete(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "STOPPED");

    let session_id: SessionId = id.parse().unwrap();
    let session_id = &session_id;
    assert!(
        eventually(|| async move { !app.app.engine.is_active(session_id) }).await,
        "consumer task still running after stop"
    );
}

#[tokio::test]
async fn records_produced_while_paused_arrive_after_resume() {
    let app = &spawn_app();
    let id = app
        .start_session(json!({"topic": "orders", "from": "EARLIEST"}))
        .await;
    let base = format!("/api/consume-sessions/{}", id);
    let messages_uri = format!("{}/messages", base);
    let messages_uri = messages_uri.as_str();

    app.post_empty(&format!("{}/pause", base)).await;
    app.produce("orders", &["while-paused"]).await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let (_, messages) = app.get(messages_uri).await;
    assert!(messages["data"].as_array().unwrap().is_empty());

    app.post_empty(&format!("{}/resume", base)).await;
    assert!(
        eventually(|| async move {
            let (_, messages) = app.get(messages_uri).await;
            messages["data"].as_array().map_or(0, Vec::len) == 1
        })
        .await,
        "record produced while paused was never delivered"
    );
}

#[tokio::test]
async fn unknown_sessions_return_404() {
    let app = spawn_app();

    for uri in [
        "/api/consume-sessions/sess_missing",
        "/api/consume-sessions/sess_missing/messages",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }

    let (status, _) = app.post_empty("/api/consume-sessions/sess_missing/pause").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/consume-sessions/sess_missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_start_requests_return_400() {
    let app = spawn_app();

    let cases = [
        json!({"topic": "orders", "from": "MIDDLE"}),
        json!({"topic": "   "}),
        json!({"topic": "orders", "maxBufferSize": 0}),
        json!({"topic": "orders", "maxBufferSize": 10001}),
        json!({"topic": "orders", "maxBufferSize": -1}),
        json!({"groupId": "missing-topic"}),
    ];
    for body in cases {
        let (status, response) = app.post("/api/consume-sessions", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", body, response);
        assert_eq!(response["code"], "VALIDATION_FAILED");
    }

    let (_, sessions) = app.get("/api/consume-sessions").await;
    assert!(sessions["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn negative_message_limit_returns_400() {
    let app = spawn_app();
    let id = app.start_session(json!({"topic": "orders"})).await;

    let (status, _) = app
        .get(&format!("/api/consume-sessions/{}/messages?limit=-1", id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_group_id_and_defaults_are_reported() {
    let app = spawn_app();

    let (_, body) = app
        .post("/api/consume-sessions", json!({"topic": "orders", "groupId": "audit-team"}))
        .await;
    assert_eq!(body["data"]["groupId"], "audit-team");
    assert_eq!(body["data"]["from"], "LATEST");
    assert_eq!(body["data"]["maxBufferSize"], 500);

    let (_, body) = app
        .post("/api/consume-sessions", json!({"topic": "orders"}))
        .await;
    let id = body["data"]["id"].as_str().unwrap();
    assert_eq!(
        body["data"]["groupId"].as_str().unwrap(),
        format!("kafka-observatory-{}", id)
    );

    let (_, sessions) = app.get("/api/consume-sessions").await;
    assert_eq!(sessions["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn backend_outage_on_start_returns_503() {
    let app = spawn_app();
    app.log.set_unavailable(true);

    let (status, body) = app
        .post("/api/consume-sessions", json!({"topic": "orders"}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "CLUSTER_UNAVAILABLE");

    // The failed session stays visible in ERROR.
    let (_, sessions) = app.get("/api/consume-sessions").await;
    assert_eq!(sessions["data"][0]["state"], "ERROR");
}

#[tokio::test]
async fn consumer_failure_moves_session_to_error() {
    let app = &spawn_app();
    let id = app.start_session(json!({"topic": "orders"})).await;

    app.log.fail_next_poll(BackendError::operation("broker lost"));

    let status_uri = format!("/api/consume-sessions/{}", id);
    let status_uri = status_uri.as_str();
    assert!(
        eventually(|| async move {
            let (_, status) = app.get(status_uri).await;
            status["data"]["state"] == "ERROR"
        })
        .await,
        "session never reached ERROR"
    );

    let (status, _) = app.post_empty(&format!("{}/pause", status_uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
