//! ConsumptionEngine - One background consumer task per live session.
//!
//! Each task owns its log consumer and loops:
//!
//! 1. Re-read the session state from the registry
//! 2. Exit on STOPPED, ERROR or a removed session
//! 3. Pause or resume the consumer when the state flipped
//! 4. Fetch for at most `fetch_timeout`, racing the session's wake signal
//! 5. Hand every fetched record to the session's sink, in order
//!
//! Control calls never touch the consumer directly. They change the state in
//! the registry and notify the task, which drops the in-flight fetch and
//! goes back to step 1. A notification sent while no fetch is running is
//! kept as a permit, so it is never lost.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::domain::consume::{ConsumeSession, ConsumeSessionState};
use crate::domain::foundation::SessionId;
use crate::ports::{BackendError, ConsumptionControl, LogConsumer, LogConsumerFactory, MessageSink};

use super::ConsumeSessionRegistry;

/// Configuration for the ConsumptionEngine.
#[derive(Debug, Clone)]
pub struct ConsumptionEngineConfig {
    /// Upper bound on a single fetch.
    pub fetch_timeout: Duration,
}

impl Default for ConsumptionEngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(500),
        }
    }
}

impl ConsumptionEngineConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

type ActiveConsumers = Arc<Mutex<HashMap<SessionId, Arc<Notify>>>>;

/// Spawns and signals the per-session consumer tasks.
pub struct ConsumptionEngine {
    factory: Arc<dyn LogConsumerFactory>,
    registry: Arc<ConsumeSessionRegistry>,
    config: ConsumptionEngineConfig,
    active: ActiveConsumers,
}

impl ConsumptionEngine {
    pub fn new(factory: Arc<dyn LogConsumerFactory>, registry: Arc<ConsumeSessionRegistry>) -> Self {
        Self::with_config(factory, registry, ConsumptionEngineConfig::default())
    }

    pub fn with_config(
        factory: Arc<dyn LogConsumerFactory>,
        registry: Arc<ConsumeSessionRegistry>,
        config: ConsumptionEngineConfig,
    ) -> Self {
        Self {
            factory,
            registry,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// True while the session's task is still running.
    pub fn is_active(&self, session_id: &SessionId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn wake(&self, session_id: &SessionId) -> bool {
        match self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
        {
            Some(wake) => {
                wake.notify_one();
                true
            }
            None => false,
        }
    }
}

impl ConsumptionControl for ConsumptionEngine {
    fn start_consumption(
        &self,
        session: &ConsumeSession,
        on_message: MessageSink,
    ) -> Result<(), BackendError> {
        let consumer = self
            .factory
            .create_consumer(&session.group_id, session.from)
            .map_err(|e| {
                tracing::error!(
                    session_id = %session.id,
                    topic = %session.topic,
                    "Failed to create consumer: {}",
                    e
                );
                e
            })?;

        let wake = Arc::new(Notify::new());
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id.clone(), wake.clone());

        let task = PollTask {
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            consumer,
            registry: self.registry.clone(),
            wake,
            fetch_timeout: self.config.fetch_timeout,
            on_message,
        };
        tokio::spawn(task.run(self.active.clone()));

        tracing::info!(
            session_id = %session.id,
            topic = %session.topic,
            group_id = %session.group_id,
            from = %session.from,
            "Started consumption"
        );
        Ok(())
    }

    fn stop_consumption(&self, session_id: &SessionId) {
        if self.wake(session_id) {
            tracing::info!(session_id = %session_id, "Stopping consumption");
        } else {
            tracing::warn!(
                session_id = %session_id,
                "Attempted to stop unknown or already stopped session"
            );
        }
    }

    fn pause_consumption(&self, session_id: &SessionId) {
        if self.wake(session_id) {
            tracing::info!(session_id = %session_id, "Triggering pause");
        }
    }

    fn resume_consumption(&self, session_id: &SessionId) {
        if self.wake(session_id) {
            tracing::info!(session_id = %session_id, "Triggering resume");
        }
    }
}

struct PollTask {
    session_id: SessionId,
    topic: String,
    consumer: Box<dyn LogConsumer>,
    registry: Arc<ConsumeSessionRegistry>,
    wake: Arc<Notify>,
    fetch_timeout: Duration,
    on_message: MessageSink,
}

impl PollTask {
    async fn run(mut self, active: ActiveConsumers) {
        if let Err(e) = self.poll_loop().await {
            tracing::error!(
                session_id = %self.session_id,
                topic = %self.topic,
                "Consumption failed: {}",
                e
            );
            if let Err(e) =
                self.registry
                    .transition_state(&self.session_id, ConsumeSessionState::Error, "fail")
            {
                tracing::debug!(session_id = %self.session_id, "Not marking session as failed: {}", e);
            }
        }

        self.consumer.close();
        active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
        tracing::info!(session_id = %self.session_id, "Consumer closed");
    }

    async fn poll_loop(&mut self) -> Result<(), BackendError> {
        self.consumer.subscribe(&self.topic)?;
        let mut paused = false;

        loop {
            let state = match self.registry.state_of(&self.session_id) {
                Some(state) => state,
                None => {
                    tracing::debug!(session_id = %self.session_id, "Session removed");
                    return Ok(());
                }
            };

            match state {
                ConsumeSessionState::Stopped | ConsumeSessionState::Error => return Ok(()),
                ConsumeSessionState::Paused if !paused => {
                    self.consumer.pause()?;
                    paused = true;
                    tracing::info!(session_id = %self.session_id, "Consumer paused");
                }
                ConsumeSessionState::Running if paused => {
                    self.consumer.resume()?;
                    paused = false;
                    tracing::info!(session_id = %self.session_id, "Consumer resumed");
                }
                _ => {}
            }

            let batch = tokio::select! {
                biased;
                _ = self.wake.notified() => continue,
                batch = self.consumer.poll(self.fetch_timeout) => batch?,
            };

            if paused {
                continue;
            }
            for message in batch {
                (self.on_message)(message);
            }
        }
    }
}
