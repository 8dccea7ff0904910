//! ConsumptionControl port - Drives the per-session background consumers.

use std::sync::Arc;

use crate::domain::consume::{ConsumeSession, ConsumedMessage};
use crate::domain::foundation::SessionId;

use super::BackendError;

/// Receives every record consumed for a session, in log order.
pub type MessageSink = Arc<dyn Fn(ConsumedMessage) + Send + Sync>;

/// Starts and signals background consumption for sessions.
///
/// The signalling calls are hints: the consumer re-reads the session state
/// after being woken, so they may be sent before or after the state change.
pub trait ConsumptionControl: Send + Sync {
    /// Creates the consumer and spawns its loop. Consumer creation errors
    /// are returned to the caller; everything after that is reported through
    /// the session state.
    fn start_consumption(
        &self,
        session: &ConsumeSession,
        on_message: MessageSink,
    ) -> Result<(), BackendError>;

    fn stop_consumption(&self, session_id: &SessionId);

    fn pause_consumption(&self, session_id: &SessionId);

    fn resume_consumption(&self, session_id: &SessionId);
}
