//! Kafka client configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::cluster::TopicSpec;

use super::error::ValidationError;

/// Which log backend the server talks to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogBackendKind {
    /// A real cluster through librdkafka
    #[default]
    Kafka,
    /// The in-process log; nothing leaves the server
    Memory,
}

/// Kafka connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    #[serde(default)]
    pub backend: LogBackendKind,

    /// Comma-separated bootstrap servers
    #[serde(default = "default_brokers")]
    pub brokers: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default)]
    pub tls_enabled: bool,

    /// PEM CA bundle
    pub tls_ca_file: Option<String>,

    /// PEM client certificate
    pub tls_cert_file: Option<String>,

    /// PEM client private key
    pub tls_key_file: Option<String>,

    #[serde(default)]
    pub sasl_enabled: bool,

    #[serde(default = "default_sasl_mechanism")]
    pub sasl_mechanism: String,

    pub sasl_username: Option<String>,

    pub sasl_password: Option<String>,

    /// Timeout for metadata, admin and produce requests in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Topics created at startup, `name[:partitions[:replication]]` comma-separated
    #[serde(default)]
    pub local_topics: String,
}

impl KafkaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `security.protocol` implied by the TLS and SASL flags
    pub fn security_protocol(&self) -> &'static str {
        match (self.tls_enabled, self.sasl_enabled) {
            (false, false) => "PLAINTEXT",
            (true, false) => "SSL",
            (false, true) => "SASL_PLAINTEXT",
            (true, true) => "SASL_SSL",
        }
    }

    pub fn topic_specs(&self) -> Result<Vec<TopicSpec>, ValidationError> {
        TopicSpec::parse_list(&self.local_topics)
            .map_err(|e| ValidationError::InvalidLocalTopics(e.to_string()))
    }

    /// Validate Kafka configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == LogBackendKind::Kafka && self.brokers.trim().is_empty() {
            return Err(ValidationError::MissingRequired("KAFKA_BROKERS"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("kafka.request_timeout_ms"));
        }
        if self.sasl_enabled {
            if !self.sasl_mechanism.eq_ignore_ascii_case("PLAIN") {
                return Err(ValidationError::UnsupportedSaslMechanism(
                    self.sasl_mechanism.clone(),
                ));
            }
            if self.sasl_username.as_deref().unwrap_or("").is_empty() {
                return Err(ValidationError::MissingRequired("KAFKA_SASL_USERNAME"));
            }
            if self.sasl_password.as_deref().unwrap_or("").is_empty() {
                return Err(ValidationError::MissingRequired("KAFKA_SASL_PASSWORD"));
            }
        }
        if self.tls_cert_file.is_some() != self.tls_key_file.is_some() {
            return Err(ValidationError::IncompleteTlsClientIdentity);
        }
        self.topic_specs()?;
        Ok(())
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            backend: LogBackendKind::default(),
            brokers: default_brokers(),
            client_id: default_client_id(),
            tls_enabled: false,
            tls_ca_file: None,
            tls_cert_file: None,
            tls_key_file: None,
            sasl_enabled: false,
            sasl_mechanism: default_sasl_mechanism(),
            sasl_username: None,
            sasl_password: None,
            request_timeout_ms: default_request_timeout_ms(),
            local_topics: String::new(),
        }
    }
}

fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_client_id() -> String {
    "kafka-observatory".to_string()
}

fn default_sasl_mechanism() -> String {
    "PLAIN".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}
