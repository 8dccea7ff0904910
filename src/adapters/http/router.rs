//! Application router assembly.

use axum::Router;
use http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_routes, WebSocketState};
use crate::application::{ClusterService, ConsumeSessionService};
use crate::config::{ServerConfig, SessionConfig};

use super::cluster::{cluster_routes, ClusterHandlers};
use super::consume_session::{consume_session_routes, ConsumeSessionHandlers};
use super::health::health_routes;

/// Builds the full HTTP + WebSocket router.
pub fn app_router(
    sessions: Arc<ConsumeSessionService>,
    cluster: Arc<ClusterService>,
    session_config: &SessionConfig,
    server_config: &ServerConfig,
) -> Router {
    let consume_handlers =
        ConsumeSessionHandlers::new(sessions.clone(), session_config.default_messages_limit);
    let ws_state = WebSocketState::new(sessions, session_config.subscriber_queue_capacity);

    Router::new()
        .nest(
            "/api",
            health_routes().merge(cluster_routes(ClusterHandlers::new(cluster))),
        )
        .nest(
            "/api/consume-sessions",
            consume_session_routes(consume_handlers),
        )
        .merge(websocket_routes(ws_state))
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(cors_layer(server_config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
