//! Process wiring: backend selection, services, router and background tasks.

use axum::Router;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::adapters::http::app_router;
use crate::adapters::{
    InMemoryLog, InMemorySessionMessageBroadcaster, KafkaClientSettings, KafkaClusterAdmin,
    KafkaLogConsumerFactory, KafkaLogProducer,
};
use crate::application::{
    ClusterService, ConsumeSessionRegistry, ConsumeSessionService, ConsumptionEngine,
    ConsumptionEngineConfig, IdleSessionSweeper, IdleSweeperConfig, SessionSettings,
};
use crate::config::{AppConfig, KafkaConfig, LogBackendKind, ServerConfig, ValidationError};
use crate::domain::cluster::TopicSpec;
use crate::ports::{BackendError, ClusterAdmin, LogConsumerFactory, LogProducer};

/// The three capabilities every log backend provides.
#[derive(Clone)]
pub struct LogBackend {
    pub consumers: Arc<dyn LogConsumerFactory>,
    pub producer: Arc<dyn LogProducer>,
    pub admin: Arc<dyn ClusterAdmin>,
}

impl LogBackend {
    /// librdkafka clients built from `config`.
    pub fn kafka(config: &KafkaConfig) -> Result<Self, BackendError> {
        let settings = Arc::new(KafkaClientSettings::from_config(config));
        Ok(Self {
            consumers: Arc::new(KafkaLogConsumerFactory::new(settings.clone())),
            producer: Arc::new(KafkaLogProducer::new(&settings)?),
            admin: Arc::new(KafkaClusterAdmin::new(&settings)?),
        })
    }

    pub fn memory(log: InMemoryLog) -> Self {
        Self {
            consumers: Arc::new(log.clone()),
            producer: Arc::new(log.clone()),
            admin: Arc::new(log),
        }
    }

    pub fn from_config(config: &KafkaConfig) -> Result<Self, BackendError> {
        match config.backend {
            LogBackendKind::Kafka => {
                tracing::info!(brokers = %config.brokers, "Using Kafka log backend");
                Self::kafka(config)
            }
            LogBackendKind::Memory => {
                tracing::info!("Using in-memory log backend");
                Ok(Self::memory(InMemoryLog::new()))
            }
        }
    }
}

/// Fully wired application, ready to serve.
pub struct Application {
    pub sessions: Arc<ConsumeSessionService>,
    pub cluster: Arc<ClusterService>,
    pub engine: Arc<ConsumptionEngine>,
    router: Router,
    sweeper: Arc<IdleSessionSweeper>,
    initial_topics: Vec<TopicSpec>,
}

impl Application {
    pub fn new(config: &AppConfig, backend: LogBackend) -> Result<Self, ValidationError> {
        let registry = Arc::new(ConsumeSessionRegistry::new());
        let engine = Arc::new(ConsumptionEngine::with_config(
            backend.consumers,
            registry.clone(),
            ConsumptionEngineConfig::default().with_fetch_timeout(config.session.fetch_timeout()),
        ));
        let broadcaster = Arc::new(InMemorySessionMessageBroadcaster::new());

        let sessions = Arc::new(ConsumeSessionService::new(
            registry,
            engine.clone(),
            broadcaster,
            SessionSettings {
                group_id_prefix: config.session.group_id_prefix.clone(),
                default_max_buffer_size: config.session.default_max_buffer_size,
                max_buffer_size_limit: config.session.max_buffer_size_limit,
            },
        ));
        let cluster = Arc::new(ClusterService::new(backend.admin, backend.producer));

        let sweeper = Arc::new(IdleSessionSweeper::new(
            sessions.clone(),
            IdleSweeperConfig::default()
                .with_check_interval(config.session.idle_check_interval())
                .with_idle_timeout(config.session.idle_timeout())
                .with_terminated_retention(config.session.terminated_retention()),
        ));

        let router = app_router(
            sessions.clone(),
            cluster.clone(),
            &config.session,
            &config.server,
        );

        Ok(Self {
            sessions,
            cluster,
            engine,
            router,
            sweeper,
            initial_topics: config.kafka.topic_specs()?,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Creates the configured initial topics that are missing.
    pub async fn bootstrap_topics(&self) -> Vec<String> {
        self.cluster.ensure_topics(&self.initial_topics).await
    }

    pub fn spawn_sweeper(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let sweeper = self.sweeper.clone();
        tokio::spawn(async move { sweeper.run(shutdown).await })
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `server.log_level`.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
