//! HTTP handlers for consume-session endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::adapters::http::response::{
    json_rejection, query_rejection, ApiResponse, ErrorResponse,
};
use crate::application::consume_session::ConsumeSessionService;
use crate::domain::consume::ConsumeSessionError;
use crate::domain::foundation::SessionId;
use crate::ports::BackendError;

use super::dto::{CreateSessionRequest, MessagesQuery};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ConsumeSessionHandlers {
    service: Arc<ConsumeSessionService>,
    default_messages_limit: usize,
}

impl ConsumeSessionHandlers {
    pub fn new(service: Arc<ConsumeSessionService>, default_messages_limit: usize) -> Self {
        Self {
            service,
            default_messages_limit,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/consume-sessions - Start a new consume session
pub async fn start_session(
    State(handlers): State<ConsumeSessionHandlers>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let cmd = match req.into_command() {
        Ok(cmd) => cmd,
        Err(e) => return handle_consume_session_error(e.into()),
    };

    match handlers.service.start_session(cmd) {
        Ok(session) => ApiResponse::new(session).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

/// GET /api/consume-sessions - List sessions, oldest first
pub async fn list_sessions(State(handlers): State<ConsumeSessionHandlers>) -> Response {
    ApiResponse::new(handlers.service.list_sessions()).into_response()
}

/// GET /api/consume-sessions/:id - Session status
pub async fn get_session_status(
    State(handlers): State<ConsumeSessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.get_status(&session_id) {
        Ok(status) => ApiResponse::new(status).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

/// GET /api/consume-sessions/:id/messages?limit= - Buffered records, newest first
pub async fn get_messages(
    State(handlers): State<ConsumeSessionHandlers>,
    Path(session_id): Path<String>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };
    let limit = match query.resolve_limit(handlers.default_messages_limit) {
        Ok(limit) => limit,
        Err(e) => return handle_consume_session_error(e.into()),
    };

    match handlers.service.get_messages(&session_id, limit) {
        Ok(messages) => ApiResponse::new(messages).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

/// POST /api/consume-sessions/:id/pause - Pause a running session
pub async fn pause_session(
    State(handlers): State<ConsumeSessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.pause_session(&session_id) {
        Ok(session) => ApiResponse::new(session).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

/// POST /api/consume-sessions/:id/resume - Resume a paused session
pub async fn resume_session(
    State(handlers): State<ConsumeSessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.resume_session(&session_id) {
        Ok(session) => ApiResponse::new(session).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

/// DELETE /api/consume-sessions/:id - Stop a session
pub async fn stop_session(
    State(handlers): State<ConsumeSessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.stop_session(&session_id) {
        Ok(session) => ApiResponse::new(session).into_response(),
        Err(e) => handle_consume_session_error(e),
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>().map_err(|_| {
        ErrorResponse::bad_request("Invalid session ID").into_response_with(StatusCode::BAD_REQUEST)
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

pub(crate) fn handle_consume_session_error(error: ConsumeSessionError) -> Response {
    let code = error.code();
    match error {
        ConsumeSessionError::NotFound(id) => {
            ErrorResponse::not_found("Consume session", id.as_str())
                .into_response_with(StatusCode::NOT_FOUND)
        }
        ConsumeSessionError::InvalidState { .. } | ConsumeSessionError::AlreadyExists(_) => {
            ErrorResponse::new(code, error.to_string()).into_response_with(StatusCode::CONFLICT)
        }
        ConsumeSessionError::Validation { ref field, .. } => {
            let details = json!({ "field": field });
            ErrorResponse::bad_request(error.to_string())
                .with_details(details)
                .into_response_with(StatusCode::BAD_REQUEST)
        }
        ConsumeSessionError::Backend(BackendError::Connectivity(message)) => {
            ErrorResponse::service_unavailable(message)
                .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        }
        ConsumeSessionError::Backend(e) => {
            tracing::error!("Consume session backend failure: {}", e);
            ErrorResponse::new(code, e.to_string())
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
