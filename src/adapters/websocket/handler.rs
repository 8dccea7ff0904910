//! WebSocket upgrade handler for live consume-session viewers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Subscribe to the session (policy-violation close if refused)
//! 2. Forward each broadcast record as a JSON text frame
//! 3. Close normally when the session is stopped
//! 4. Unsubscribe when the client disconnects

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;

use crate::adapters::http::ErrorResponse;
use crate::application::consume_session::ConsumeSessionService;
use crate::domain::consume::{ConsumeSessionError, ConsumedMessage};
use crate::domain::foundation::SessionId;
use crate::ports::{CloseCallback, MessageCallback, SubscriberError};

const SESSION_STOPPED_REASON: &str = "Consume session stopped";

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub service: Arc<ConsumeSessionService>,
    /// Outbound frames buffered per viewer before records are dropped.
    pub queue_capacity: usize,
}

impl WebSocketState {
    pub fn new(service: Arc<ConsumeSessionService>, queue_capacity: usize) -> Self {
        Self {
            service,
            queue_capacity: queue_capacity.max(1),
        }
    }
}

/// Handle WebSocket upgrade requests for a consume session.
///
/// Route: `GET /ws/consume-sessions/:session_id`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    let session_id: SessionId = match session_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return ErrorResponse::bad_request("Session ID missing in path")
                .into_response_with(StatusCode::BAD_REQUEST);
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Runs for the lifetime of one viewer connection.
async fn handle_socket(socket: WebSocket, session_id: SessionId, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(state.queue_capacity);
    let (close_tx, mut close_rx) = oneshot::channel::<()>();

    let on_message: MessageCallback = Arc::new(move |message: &ConsumedMessage| {
        let payload = serde_json::to_string(message)
            .map_err(|e| SubscriberError::Rejected(e.to_string()))?;
        match frame_tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Dropping message for slow WebSocket client");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SubscriberError::Disconnected),
        }
    });
    let on_close: CloseCallback = Box::new(move || {
        let _ = close_tx.send(());
    });

    let subscription_id = match state.service.subscribe(&session_id, on_message, on_close) {
        Ok(id) => id,
        Err(e) => {
            let (code, reason) = match e {
                ConsumeSessionError::NotFound(ref id) => {
                    (close_code::POLICY, format!("Session {} not found", id))
                }
                ConsumeSessionError::InvalidState { .. } => (close_code::POLICY, e.to_string()),
                _ => (close_code::ERROR, e.to_string()),
            };
            tracing::warn!(session_id = %session_id, "Rejecting WebSocket: {}", reason);
            let _ = send_close(&mut sender, code, reason).await;
            return;
        }
    };
    tracing::info!(
        session_id = %session_id,
        subscription_id = %subscription_id,
        "WebSocket client subscribed to consume session"
    );

    // Forward queued records; the close signal wins only once the queue is drained.
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                frame = frame_rx.recv() => match frame {
                    Some(payload) => {
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        if close_rx.try_recv().is_ok() {
                            let _ = send_close(&mut sender, close_code::NORMAL, SESSION_STOPPED_REASON).await;
                        }
                        break;
                    }
                },
                closed = &mut close_rx => {
                    if closed.is_ok() {
                        let _ = send_close(&mut sender, close_code::NORMAL, SESSION_STOPPED_REASON).await;
                    }
                    break;
                }
            }
        }
    });

    let recv_session_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    tracing::debug!(session_id = %recv_session_id, "Client sent close frame");
                    break;
                }
                Ok(_) => {
                    // Viewers are read-only; inbound frames are ignored.
                }
                Err(e) => {
                    tracing::debug!(session_id = %recv_session_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.service.unsubscribe(&session_id, &subscription_id);
    tracing::info!(
        session_id = %session_id,
        subscription_id = %subscription_id,
        "WebSocket client disconnected"
    );
}

async fn send_close(
    sender: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: impl Into<Cow<'static, str>>,
) -> Result<(), axum::Error> {
    sender
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
}

/// Creates the WebSocket router, mounted at the root.
pub fn websocket_routes(state: WebSocketState) -> Router {
    Router::new()
        .route("/ws/consume-sessions/:session_id", get(ws_handler))
        .with_state(state)
}
