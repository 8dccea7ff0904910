//! HTTP handlers for cluster endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::response::{json_rejection, ApiResponse, ErrorResponse};
use crate::application::cluster::ClusterService;
use crate::domain::cluster::{ClusterError, ProduceRequest};
use crate::ports::BackendError;

#[derive(Clone)]
pub struct ClusterHandlers {
    service: Arc<ClusterService>,
}

impl ClusterHandlers {
    pub fn new(service: Arc<ClusterService>) -> Self {
        Self { service }
    }
}

/// GET /api/cluster - Cluster id and brokers
pub async fn describe_cluster(State(handlers): State<ClusterHandlers>) -> Response {
    match handlers.service.describe_cluster().await {
        Ok(info) => ApiResponse::new(info).into_response(),
        Err(e) => handle_cluster_error(e),
    }
}

/// GET /api/topics - Topics sorted by name
pub async fn list_topics(State(handlers): State<ClusterHandlers>) -> Response {
    match handlers.service.list_topics().await {
        Ok(topics) => ApiResponse::new(topics).into_response(),
        Err(e) => handle_cluster_error(e),
    }
}

/// POST /api/produce - Write one record
pub async fn produce(
    State(handlers): State<ClusterHandlers>,
    body: Result<Json<ProduceRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    match handlers.service.produce(request).await {
        Ok(response) => ApiResponse::new(response).into_response(),
        Err(e) => handle_cluster_error(e),
    }
}

fn handle_cluster_error(error: ClusterError) -> Response {
    let code = error.code();
    match error {
        ClusterError::Validation(e) => {
            ErrorResponse::bad_request(e.to_string()).into_response_with(StatusCode::BAD_REQUEST)
        }
        ClusterError::Backend(BackendError::Connectivity(message)) => {
            ErrorResponse::service_unavailable(message)
                .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        }
        ClusterError::Backend(e) => ErrorResponse::new(code, e.to_string())
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
