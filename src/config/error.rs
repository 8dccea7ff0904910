//! Errors raised while loading and checking [`AppConfig`](super::AppConfig).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A configuration value that parses but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set")]
    MissingRequired(&'static str),

    #[error("Port must be between 1 and 65535")]
    InvalidPort,

    #[error("Host is not an IP address: {0}")]
    InvalidBindAddress(String),

    #[error("Request timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("Unsupported SASL mechanism: {0}")]
    UnsupportedSaslMechanism(String),

    #[error("TLS client certificate and key must be configured together")]
    IncompleteTlsClientIdentity,

    #[error("Invalid local topic list: {0}")]
    InvalidLocalTopics(String),

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Default max buffer size ({default}) exceeds the limit ({limit})")]
    BufferDefaultExceedsLimit { default: usize, limit: usize },
}
