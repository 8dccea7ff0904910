//! ConsumeSessionService - Lifecycle rules for consume sessions.
//!
//! Orchestrates the registry, the consumption engine and the broadcaster.
//! It is the only component that validates lifecycle transitions.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::consume::{
    ConsumeSession, ConsumeSessionError, ConsumeSessionState, ConsumeSessionStatus,
    ConsumedMessage, OffsetPolicy,
};
use crate::domain::foundation::{SessionId, SubscriptionId, Timestamp, ValidationError};
use crate::ports::{
    CloseCallback, ConsumptionControl, MessageCallback, MessageSink, SessionMessageBroadcaster,
};

use super::ConsumeSessionRegistry;

/// Defaults and limits applied when starting sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Prefix of generated consumer group ids (`<prefix>-<session id>`).
    pub group_id_prefix: String,
    pub default_max_buffer_size: usize,
    pub max_buffer_size_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            group_id_prefix: "kafka-observatory".to_string(),
            default_max_buffer_size: 500,
            max_buffer_size_limit: 10_000,
        }
    }
}

/// Parameters of a new consume session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSessionCommand {
    pub topic: String,
    pub group_id: Option<String>,
    pub from: OffsetPolicy,
    /// Falls back to [`SessionSettings::default_max_buffer_size`].
    pub max_buffer_size: Option<usize>,
}

impl StartSessionCommand {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            group_id: None,
            from: OffsetPolicy::default(),
            max_buffer_size: None,
        }
    }

    pub fn from(mut self, from: OffsetPolicy) -> Self {
        self.from = from;
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = Some(size);
        self
    }
}

pub struct ConsumeSessionService {
    registry: Arc<ConsumeSessionRegistry>,
    consumption: Arc<dyn ConsumptionControl>,
    broadcaster: Arc<dyn SessionMessageBroadcaster>,
    settings: SessionSettings,
}

impl ConsumeSessionService {
    pub fn new(
        registry: Arc<ConsumeSessionRegistry>,
        consumption: Arc<dyn ConsumptionControl>,
        broadcaster: Arc<dyn SessionMessageBroadcaster>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            registry,
            consumption,
            broadcaster,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Registers a RUNNING session and starts consuming for it.
    ///
    /// When the consumer cannot be created the session stays registered in
    /// ERROR, its broadcaster entry is closed and the backend error is returned.
    pub fn start_session(
        &self,
        cmd: StartSessionCommand,
    ) -> Result<ConsumeSession, ConsumeSessionError> {
        let topic = cmd.topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::empty_field("topic").into());
        }

        let max_buffer_size = cmd
            .max_buffer_size
            .unwrap_or(self.settings.default_max_buffer_size);
        if max_buffer_size == 0 || max_buffer_size > self.settings.max_buffer_size_limit {
            return Err(ValidationError::out_of_range(
                "max_buffer_size",
                1,
                self.settings.max_buffer_size_limit as i64,
                max_buffer_size as i64,
            )
            .into());
        }

        let id = SessionId::new();
        let group_id = match cmd.group_id.as_deref().map(str::trim) {
            Some(group_id) if !group_id.is_empty() => group_id.to_string(),
            _ => format!("{}-{}", self.settings.group_id_prefix, id),
        };

        let session = ConsumeSession::new(id.clone(), topic, group_id, cmd.from, max_buffer_size);
        self.registry.register(session.clone())?;

        let registry = self.registry.clone();
        let broadcaster = self.broadcaster.clone();
        let sink_id = id.clone();
        let on_message: MessageSink = Arc::new(move |message: ConsumedMessage| {
            deliver(&registry, broadcaster.as_ref(), &sink_id, message);
        });

        if let Err(e) = self.consumption.start_consumption(&session, on_message) {
            tracing::error!(session_id = %id, topic = %session.topic, "Failed to start session: {}", e);
            self.registry.update_state(&id, ConsumeSessionState::Error);
            self.broadcaster.close_session(&id);
            return Err(e.into());
        }

        tracing::info!(
            session_id = %id,
            topic = %session.topic,
            group_id = %session.group_id,
            "Consume session started"
        );
        Ok(session)
    }

    pub fn pause_session(&self, id: &SessionId) -> Result<ConsumeSession, ConsumeSessionError> {
        self.registry
            .transition_state(id, ConsumeSessionState::Paused, "pause")?;
        self.consumption.pause_consumption(id);
        tracing::info!(session_id = %id, "Consume session paused");
        self.require_session(id)
    }

    /// Resuming a RUNNING session re-asserts the state.
    pub fn resume_session(&self, id: &SessionId) -> Result<ConsumeSession, ConsumeSessionError> {
        self.registry
            .transition_state(id, ConsumeSessionState::Running, "resume")?;
        self.consumption.resume_consumption(id);
        tracing::info!(session_id = %id, "Consume session resumed");
        self.require_session(id)
    }

    /// Stops the session and detaches every viewer.
    ///
    /// Stopping an already terminal session keeps its state and repeats the
    /// cleanup.
    pub fn stop_session(&self, id: &SessionId) -> Result<ConsumeSession, ConsumeSessionError> {
        let session = self.require_session(id)?;
        if session.state.is_live() {
            if let Err(e) = self
                .registry
                .transition_state(id, ConsumeSessionState::Stopped, "stop")
            {
                tracing::debug!(session_id = %id, "Session left running state concurrently: {}", e);
            }
        }
        self.consumption.stop_consumption(id);
        self.broadcaster.close_session(id);
        tracing::info!(session_id = %id, "Consume session stopped");
        self.require_session(id)
    }

    /// Attaches a live viewer. Only RUNNING and PAUSED sessions accept viewers.
    pub fn subscribe(
        &self,
        id: &SessionId,
        on_message: MessageCallback,
        on_close: CloseCallback,
    ) -> Result<SubscriptionId, ConsumeSessionError> {
        let session = self.require_session(id)?;
        if !session.state.accepts_subscribers() {
            return Err(ConsumeSessionError::invalid_state(
                id.clone(),
                session.state,
                "subscribe to",
            ));
        }
        let subscription_id = self.broadcaster.subscribe(id, on_message, on_close);

        // A stop landing between the check above and the registration has
        // already closed the session's subscribers; this one must not stay.
        match self.registry.state_of(id) {
            Some(state) if state.accepts_subscribers() => {}
            state => {
                self.broadcaster.unsubscribe(id, &subscription_id);
                return Err(match state {
                    Some(state) => ConsumeSessionError::invalid_state(id.clone(), state, "subscribe to"),
                    None => ConsumeSessionError::not_found(id.clone()),
                });
            }
        }

        tracing::debug!(session_id = %id, subscription_id = %subscription_id, "Subscriber attached");
        Ok(subscription_id)
    }

    pub fn unsubscribe(&self, id: &SessionId, subscription_id: &SubscriptionId) {
        self.broadcaster.unsubscribe(id, subscription_id);
        tracing::debug!(session_id = %id, subscription_id = %subscription_id, "Subscriber detached");
    }

    pub fn get_session(&self, id: &SessionId) -> Result<ConsumeSession, ConsumeSessionError> {
        self.require_session(id)
    }

    pub fn list_sessions(&self) -> Vec<ConsumeSession> {
        let mut sessions = self.registry.get_all_sessions();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sessions
    }

    pub fn get_status(&self, id: &SessionId) -> Result<ConsumeSessionStatus, ConsumeSessionError> {
        let session = self.require_session(id)?;
        Ok(ConsumeSessionStatus::from_session(
            &session,
            self.registry.get_buffer_size(id),
            self.broadcaster.subscriber_count(id),
        ))
    }

    /// Up to `limit` buffered records, newest first.
    pub fn get_messages(
        &self,
        id: &SessionId,
        limit: usize,
    ) -> Result<Vec<ConsumedMessage>, ConsumeSessionError> {
        self.require_session(id)?;
        Ok(self.registry.get_messages(id, limit))
    }

    /// Stops every RUNNING or PAUSED session whose last activity is older
    /// than `max_idle`. Returns the ids that were stopped.
    pub fn check_idle_sessions(&self, max_idle: Duration) -> Vec<SessionId> {
        let cutoff = Timestamp::now().minus(max_idle);
        let mut stopped = Vec::new();

        for session in self.registry.get_all_sessions() {
            if !session.is_idle_since(&cutoff) {
                continue;
            }
            tracing::info!(
                session_id = %session.id,
                last_activity_at = %session.last_activity_at().as_datetime(),
                "Stopping idle consume session"
            );
            match self.stop_session(&session.id) {
                Ok(_) => stopped.push(session.id),
                Err(e) => tracing::warn!(session_id = %session.id, "Failed to stop idle session: {}", e),
            }
        }
        stopped
    }

    /// Removes STOPPED and ERROR sessions that terminated more than
    /// `retention` ago, releasing their buffers.
    pub fn evict_terminated(&self, retention: Duration) -> Vec<SessionId> {
        let cutoff = Timestamp::now().minus(retention);
        let mut evicted = Vec::new();

        for session in self.registry.get_all_sessions() {
            match session.terminated_since() {
                Some(terminated_at) if terminated_at.is_before(&cutoff) => {}
                _ => continue,
            }
            if self.registry.remove_session(&session.id).is_some() {
                tracing::debug!(session_id = %session.id, state = %session.state, "Evicted terminated session");
                evicted.push(session.id);
            }
        }
        evicted
    }

    /// Stops every live session. Used on process shutdown.
    pub fn stop_all(&self) -> usize {
        let live: Vec<SessionId> = self
            .registry
            .get_all_sessions()
            .into_iter()
            .filter(|s| s.state.is_live())
            .map(|s| s.id)
            .collect();
        for id in &live {
            if let Err(e) = self.stop_session(id) {
                tracing::warn!(session_id = %id, "Failed to stop session on shutdown: {}", e);
            }
        }
        live.len()
    }

    /// Buffers the record, then fans it out to live viewers.
    pub fn on_message_consumed(&self, id: &SessionId, message: ConsumedMessage) {
        deliver(&self.registry, self.broadcaster.as_ref(), id, message);
    }

    fn require_session(&self, id: &SessionId) -> Result<ConsumeSession, ConsumeSessionError> {
        self.registry
            .get_session(id)
            .ok_or_else(|| ConsumeSessionError::not_found(id.clone()))
    }
}

fn deliver(
    registry: &ConsumeSessionRegistry,
    broadcaster: &dyn SessionMessageBroadcaster,
    id: &SessionId,
    message: ConsumedMessage,
) {
    registry.add_message(id, message.clone());
    broadcaster.broadcast(id, &message);
}
