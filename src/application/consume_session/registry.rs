//! In-memory registry of consume sessions and their message buffers.
//!
//! The outer map is only locked long enough to find (or insert) a session's
//! slot. Each slot carries its own locks, so buffer writes for one session
//! never contend with another session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::consume::{
    ConsumeSession, ConsumeSessionError, ConsumeSessionState, ConsumedMessage, MessageBuffer,
};
use crate::domain::foundation::{SessionId, StateMachine};

struct SessionSlot {
    session: RwLock<ConsumeSession>,
    buffer: Mutex<MessageBuffer>,
}

/// Session-id → session metadata and bounded message buffer.
#[derive(Default)]
pub struct ConsumeSessionRegistry {
    slots: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
}

impl ConsumeSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session with an empty buffer sized to its `max_buffer_size`.
    pub fn register(&self, session: ConsumeSession) -> Result<(), ConsumeSessionError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.contains_key(&session.id) {
            return Err(ConsumeSessionError::AlreadyExists(session.id));
        }
        let id = session.id.clone();
        let slot = SessionSlot {
            buffer: Mutex::new(MessageBuffer::with_capacity(session.max_buffer_size)),
            session: RwLock::new(session),
        };
        slots.insert(id, Arc::new(slot));
        Ok(())
    }

    pub fn get_session(&self, id: &SessionId) -> Option<ConsumeSession> {
        self.slot(id)
            .map(|slot| slot.session.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Current state, without cloning the whole session.
    pub fn state_of(&self, id: &SessionId) -> Option<ConsumeSessionState> {
        self.slot(id)
            .map(|slot| slot.session.read().unwrap_or_else(PoisonError::into_inner).state)
    }

    /// Replaces the session state. No-op when the session is absent.
    pub fn update_state(&self, id: &SessionId, state: ConsumeSessionState) {
        if let Some(slot) = self.slot(id) {
            slot.session
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .set_state(state);
        }
    }

    /// Moves the session to `target` if the lifecycle allows it, atomically
    /// with respect to other state changes. Re-asserting the current state
    /// succeeds without change. Returns the previous state.
    pub fn transition_state(
        &self,
        id: &SessionId,
        target: ConsumeSessionState,
        operation: &'static str,
    ) -> Result<ConsumeSessionState, ConsumeSessionError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| ConsumeSessionError::not_found(id.clone()))?;
        let mut session = slot.session.write().unwrap_or_else(PoisonError::into_inner);
        let current = session.state;
        if current == target {
            return Ok(current);
        }
        let next = current
            .transition_to(target)
            .map_err(|_| ConsumeSessionError::invalid_state(id.clone(), current, operation))?;
        session.set_state(next);
        Ok(current)
    }

    /// Appends a record to the session's buffer and records its timestamp
    /// as the last consumption time. No-op when the session is absent.
    pub fn add_message(&self, id: &SessionId, message: ConsumedMessage) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let consumed_at = message.consumed_at();
        slot.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        slot.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .last_consumed_at = Some(consumed_at);
    }

    /// Up to `limit` most recent records, newest first.
    pub fn get_messages(&self, id: &SessionId, limit: usize) -> Vec<ConsumedMessage> {
        self.slot(id)
            .map(|slot| {
                slot.buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .newest(limit)
            })
            .unwrap_or_default()
    }

    pub fn get_buffer_size(&self, id: &SessionId) -> usize {
        self.slot(id)
            .map(|slot| slot.buffer.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    /// Snapshot of every registered session.
    pub fn get_all_sessions(&self) -> Vec<ConsumeSession> {
        let slots: Vec<Arc<SessionSlot>> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        slots
            .iter()
            .map(|slot| slot.session.read().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    /// Drops a session together with its buffer.
    pub fn remove_session(&self, id: &SessionId) -> Option<ConsumeSession> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .map(|slot| slot.session.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &SessionId) -> Option<Arc<SessionSlot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
