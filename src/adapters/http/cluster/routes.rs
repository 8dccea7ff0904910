//! HTTP routes for cluster endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{describe_cluster, list_topics, produce, ClusterHandlers};

/// Creates the cluster router, mounted at `/api`.
pub fn cluster_routes(handlers: ClusterHandlers) -> Router {
    Router::new()
        .route("/cluster", get(describe_cluster))
        .route("/topics", get(list_topics))
        .route("/produce", post(produce))
        .with_state(handlers)
}
