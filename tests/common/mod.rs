//! Shared harness for integration tests: an application wired to the
//! in-memory log backend.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Method, Request, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tower::ServiceExt;

use kafka_observatory::adapters::InMemoryLog;
use kafka_observatory::config::{AppConfig, LogBackendKind};
use kafka_observatory::server::{Application, LogBackend};

pub struct TestApp {
    pub app: Application,
    pub log: InMemoryLog,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.kafka.backend = LogBackendKind::Memory;
    config.session.fetch_timeout_ms = 20;
    config
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: AppConfig) -> TestApp {
    let log = InMemoryLog::new();
    let app = Application::new(&config, LogBackend::memory(log.clone())).unwrap();
    TestApp { app, log }
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.app.router()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::POST, uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None).await
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Starts a session over HTTP and returns its id.
    pub async fn start_session(&self, body: Value) -> String {
        let (status, json) = self.post("/api/consume-sessions", body).await;
        assert_eq!(status, StatusCode::OK, "start failed: {}", json);
        json["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn produce(&self, topic: &str, values: &[&str]) {
        for value in values {
            let (status, json) = self
                .post(
                    "/api/produce",
                    serde_json::json!({"topic": topic, "value": value}),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "produce failed: {}", json);
        }
    }
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
