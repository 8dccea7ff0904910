//! In-process fan-out of consumed records to session subscribers.
//!
//! Subscribers are snapshotted under the read lock and invoked after it is
//! released, so a callback may subscribe or unsubscribe without deadlocking.
//! Each callback is isolated: an error or panic in one subscriber is logged
//! and delivery continues with the next.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::consume::ConsumedMessage;
use crate::domain::foundation::{SessionId, SubscriptionId};
use crate::ports::{CloseCallback, MessageCallback, SessionMessageBroadcaster};

struct Subscriber {
    id: SubscriptionId,
    on_message: MessageCallback,
    on_close: Mutex<Option<CloseCallback>>,
}

impl Subscriber {
    fn close(&self) {
        let callback = self
            .on_close
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                tracing::warn!(subscription_id = %self.id, "Close callback panicked");
            }
        }
    }
}

/// Broadcaster backed by a map of session id to subscriber list.
#[derive(Default)]
pub struct InMemorySessionMessageBroadcaster {
    sessions: RwLock<HashMap<SessionId, Vec<Arc<Subscriber>>>>,
}

impl InMemorySessionMessageBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, session_id: &SessionId) -> Vec<Arc<Subscriber>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl SessionMessageBroadcaster for InMemorySessionMessageBroadcaster {
    fn subscribe(
        &self,
        session_id: &SessionId,
        on_message: MessageCallback,
        on_close: CloseCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        let subscriber = Arc::new(Subscriber {
            id,
            on_message,
            on_close: Mutex::new(Some(on_close)),
        });
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.clone())
            .or_default()
            .push(subscriber);
        tracing::debug!(session_id = %session_id, subscription_id = %id, "Subscriber added");
        id
    }

    fn unsubscribe(&self, session_id: &SessionId, subscription_id: &SubscriptionId) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = sessions.get_mut(session_id) {
            subscribers.retain(|s| s.id != *subscription_id);
            if subscribers.is_empty() {
                sessions.remove(session_id);
            }
            tracing::debug!(
                session_id = %session_id,
                subscription_id = %subscription_id,
                "Subscriber removed"
            );
        }
    }

    fn broadcast(&self, session_id: &SessionId, message: &ConsumedMessage) {
        for subscriber in self.snapshot(session_id) {
            match catch_unwind(AssertUnwindSafe(|| (subscriber.on_message)(message))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(
                        session_id = %session_id,
                        subscription_id = %subscriber.id,
                        "Subscriber did not accept message: {}",
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        session_id = %session_id,
                        subscription_id = %subscriber.id,
                        "Subscriber callback panicked"
                    );
                }
            }
        }
    }

    fn close_session(&self, session_id: &SessionId) {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .unwrap_or_default();
        if !removed.is_empty() {
            tracing::debug!(
                session_id = %session_id,
                subscribers = removed.len(),
                "Closing session subscribers"
            );
        }
        for subscriber in removed {
            subscriber.close();
        }
    }

    fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map_or(0, Vec::len)
    }
}
