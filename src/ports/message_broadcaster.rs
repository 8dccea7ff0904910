//! SessionMessageBroadcaster port - Fan-out of consumed records to live viewers.
//!
//! Subscribers are callback pairs. `on_message` runs on the consumption task
//! and must not block; a transport that cannot accept a record immediately
//! should drop it for that subscriber. `on_close` runs at most once, when the
//! session is closed.

use std::sync::Arc;

use crate::domain::consume::ConsumedMessage;
use crate::domain::foundation::{SessionId, SubscriptionId};

/// Failure reported by a subscriber callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriberError {
    /// The viewer's transport has gone away.
    #[error("Subscriber disconnected")]
    Disconnected,

    /// The viewer refused the record.
    #[error("Subscriber rejected message: {0}")]
    Rejected(String),
}

/// Called for every record broadcast to the session.
pub type MessageCallback =
    Arc<dyn Fn(&ConsumedMessage) -> Result<(), SubscriberError> + Send + Sync>;

/// Called once when the session is closed.
pub type CloseCallback = Box<dyn FnOnce() + Send>;

pub trait SessionMessageBroadcaster: Send + Sync {
    /// Registers a subscriber for `session_id`.
    fn subscribe(
        &self,
        session_id: &SessionId,
        on_message: MessageCallback,
        on_close: CloseCallback,
    ) -> SubscriptionId;

    /// Removes a subscriber. Unknown ids are ignored.
    fn unsubscribe(&self, session_id: &SessionId, subscription_id: &SubscriptionId);

    /// Delivers `message` to every current subscriber of the session.
    ///
    /// A failing subscriber never prevents delivery to the others.
    fn broadcast(&self, session_id: &SessionId, message: &ConsumedMessage);

    /// Drops every subscriber of the session, invoking each `on_close`.
    fn close_session(&self, session_id: &SessionId);

    /// Number of live subscribers for the session.
    fn subscriber_count(&self, session_id: &SessionId) -> usize;
}
