//! IdleSessionSweeper - Background reclamation of abandoned sessions.
//!
//! On every tick the sweeper:
//! 1. Stops RUNNING/PAUSED sessions that have been quiet for `idle_timeout`
//! 2. Evicts STOPPED/ERROR sessions older than `terminated_retention`, if set
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `check_interval` | 60s | Time between sweeps |
//! | `idle_timeout` | 5m | Inactivity before a live session is stopped |
//! | `terminated_retention` | none | How long stopped sessions stay queryable |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use super::ConsumeSessionService;

/// Configuration for the IdleSessionSweeper.
#[derive(Debug, Clone)]
pub struct IdleSweeperConfig {
    pub check_interval: Duration,
    pub idle_timeout: Duration,
    /// `None` keeps terminated sessions until the process exits.
    pub terminated_retention: Option<Duration>,
}

impl Default for IdleSweeperConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
            terminated_retention: None,
        }
    }
}

impl IdleSweeperConfig {
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_terminated_retention(mut self, retention: Option<Duration>) -> Self {
        self.terminated_retention = retention;
        self
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub stopped: usize,
    pub evicted: usize,
}

pub struct IdleSessionSweeper {
    service: Arc<ConsumeSessionService>,
    config: IdleSweeperConfig,
}

impl IdleSessionSweeper {
    pub fn new(service: Arc<ConsumeSessionService>, config: IdleSweeperConfig) -> Self {
        Self { service, config }
    }

    /// Sweeps on a fixed cadence until the shutdown flag flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Idle session sweeper stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_once();
                }
            }
        }
    }

    /// Run exactly one sweep.
    pub fn sweep_once(&self) -> SweepReport {
        let stopped = self.service.check_idle_sessions(self.config.idle_timeout).len();
        let evicted = match self.config.terminated_retention {
            Some(retention) => self.service.evict_terminated(retention).len(),
            None => 0,
        };
        if stopped > 0 || evicted > 0 {
            tracing::info!(stopped, evicted, "Idle session sweep complete");
        }
        SweepReport { stopped, evicted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broadcast::InMemorySessionMessageBroadcaster;
    use crate::application::consume_session::{ConsumeSessionRegistry, SessionSettings};
    use crate::domain::consume::{ConsumeSession, ConsumeSessionState, ConsumedMessage, OffsetPolicy};
    use crate::domain::foundation::{SessionId, Timestamp};
    use crate::ports::{BackendError, ConsumptionControl, MessageSink};

    struct NoopConsumption;

    impl ConsumptionControl for NoopConsumption {
        fn start_consumption(&self, _: &ConsumeSession, _: MessageSink) -> Result<(), BackendError> {
            Ok(())
        }
        fn stop_consumption(&self, _: &SessionId) {}
        fn pause_consumption(&self, _: &SessionId) {}
        fn resume_consumption(&self, _: &SessionId) {}
    }

    fn setup(config: IdleSweeperConfig) -> (IdleSessionSweeper, Arc<ConsumeSessionRegistry>) {
        let registry = Arc::new(ConsumeSessionRegistry::new());
        let service = Arc::new(ConsumeSessionService::new(
            registry.clone(),
            Arc::new(NoopConsumption),
            Arc::new(InMemorySessionMessageBroadcaster::new()),
            SessionSettings::default(),
        ));
        (IdleSessionSweeper::new(service, config), registry)
    }

    fn register(registry: &ConsumeSessionRegistry, state: ConsumeSessionState, age: Duration) -> SessionId {
        let mut session = ConsumeSession::new(SessionId::new(), "orders", "g", OffsetPolicy::Latest, 10)
            .with_created_at(Timestamp::now().minus(age));
        session.state = state;
        let id = session.id.clone();
        registry.register(session).unwrap();
        id
    }

    #[test]
    fn sweep_once_stops_idle_sessions() {
        let (sweeper, registry) = setup(IdleSweeperConfig::default());
        let idle = register(&registry, ConsumeSessionState::Running, Duration::from_secs(600));
        let fresh = register(&registry, ConsumeSessionState::Running, Duration::ZERO);

        let report = sweeper.sweep_once();

        assert_eq!(report, SweepReport { stopped: 1, evicted: 0 });
        assert_eq!(registry.state_of(&idle), Some(ConsumeSessionState::Stopped));
        assert_eq!(registry.state_of(&fresh), Some(ConsumeSessionState::Running));
    }

    #[test]
    fn sweep_once_evicts_when_retention_is_set() {
        let config = IdleSweeperConfig::default()
            .with_terminated_retention(Some(Duration::from_secs(60)));
        let (sweeper, registry) = setup(config);
        let old = register(&registry, ConsumeSessionState::Stopped, Duration::from_secs(600));

        let report = sweeper.sweep_once();

        assert_eq!(report.evicted, 1);
        assert!(registry.get_session(&old).is_none());
    }

    #[test]
    fn recently_active_session_survives_sweep() {
        let (sweeper, registry) = setup(IdleSweeperConfig::default());
        let id = register(&registry, ConsumeSessionState::Paused, Duration::from_secs(600));
        registry.add_message(
            &id,
            ConsumedMessage::new("orders", 0, 1, Timestamp::now().as_unix_millis()),
        );

        assert_eq!(sweeper.sweep_once().stopped, 0);
    }

    #[tokio::test]
    async fn run_sweeps_periodically_and_stops_on_shutdown() {
        let config = IdleSweeperConfig::default()
            .with_check_interval(Duration::from_millis(20))
            .with_idle_timeout(Duration::from_millis(50));
        let (sweeper, registry) = setup(config);
        let id = register(&registry, ConsumeSessionState::Running, Duration::from_secs(1));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { sweeper.run(rx).await });

        for _ in 0..100 {
            if registry.state_of(&id) == Some(ConsumeSessionState::Stopped) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.state_of(&id), Some(ConsumeSessionState::Stopped));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
