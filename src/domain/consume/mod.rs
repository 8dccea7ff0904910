//! Consume-session domain: sessions, their lifecycle states, consumed
//! records and the bounded buffer that retains them.

mod buffer;
mod errors;
mod message;
mod session;
mod state;
mod status;

pub use buffer::MessageBuffer;
pub use errors::ConsumeSessionError;
pub use message::ConsumedMessage;
pub use session::{ConsumeSession, OffsetPolicy};
pub use state::ConsumeSessionState;
pub use status::ConsumeSessionStatus;
