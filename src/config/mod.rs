//! Typed settings read from `KAFKA_OBSERVATORY__*` environment variables.
//!
//! A `.env` file is honoured during development. Nested keys use `__`, so
//! `KAFKA_OBSERVATORY__SESSION__IDLE_TIMEOUT_SECS=120` sets
//! `session.idle_timeout_secs`.
//!
//! ```no_run
//! use kafka_observatory::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod kafka;
mod server;
mod session;

pub use error::{ConfigError, ValidationError};
pub use kafka::{KafkaConfig, LogBackendKind};
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// All settings. Every section has defaults, so an empty environment yields
/// a server that talks to `localhost:9092`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener, logging and CORS
    #[serde(default)]
    pub server: ServerConfig,

    /// Log backend and Kafka client configuration
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Consume-session limits and timings
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    ///
    /// Only parse failures are reported here; call [`validate`](Self::validate)
    /// for semantic checks.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::debug!("Ignoring unreadable .env file: {}", e);
            }
        }

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("KAFKA_OBSERVATORY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// First invalid value across all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.kafka.validate()?;
        self.session.validate()?;
        Ok(())
    }
}
