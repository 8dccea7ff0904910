//! WebSocket adapter streaming consumed records to live viewers.
//!
//! ```text
//! ConsumptionEngine ──records──▶ SessionMessageBroadcaster
//!                                   │ on_message (try_send)
//!                                   ▼
//!                         bounded queue per viewer ──▶ WebSocket text frames
//! ```
//!
//! A viewer whose queue is full loses records instead of slowing the
//! consumer down. When the session stops every viewer receives a normal
//! close frame.

pub mod handler;

pub use handler::{websocket_routes, ws_handler, WebSocketState};
