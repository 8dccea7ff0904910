//! HTTP adapter for consume-session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreateSessionRequest, MessagesQuery};
pub use handlers::ConsumeSessionHandlers;
pub use routes::consume_session_routes;
