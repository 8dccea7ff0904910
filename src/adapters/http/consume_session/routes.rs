//! HTTP routes for consume-session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    get_messages, get_session_status, list_sessions, pause_session, resume_session,
    start_session, stop_session, ConsumeSessionHandlers,
};

/// Creates the consume-session router, mounted at `/api/consume-sessions`.
pub fn consume_session_routes(handlers: ConsumeSessionHandlers) -> Router {
    Router::new()
        .route("/", post(start_session).get(list_sessions))
        .route("/:session_id", get(get_session_status).delete(stop_session))
        .route("/:session_id/messages", get(get_messages))
        .route("/:session_id/pause", post(pause_session))
        .route("/:session_id/resume", post(resume_session))
        .with_state(handlers)
}
