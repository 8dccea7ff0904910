//! Shared librdkafka client properties.

use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::KafkaConfig;
use crate::domain::consume::OffsetPolicy;
use crate::ports::BackendError;

#[derive(Debug, Clone)]
struct SaslCredentials {
    mechanism: String,
    username: String,
    password: SecretString,
}

/// Connection and security properties common to every client.
#[derive(Debug, Clone)]
pub struct KafkaClientSettings {
    brokers: String,
    client_id: String,
    security_protocol: &'static str,
    tls_ca_file: Option<String>,
    tls_cert_file: Option<String>,
    tls_key_file: Option<String>,
    sasl: Option<SaslCredentials>,
    request_timeout: Duration,
}

impl KafkaClientSettings {
    pub fn from_config(config: &KafkaConfig) -> Self {
        let sasl = config.sasl_enabled.then(|| SaslCredentials {
            mechanism: config.sasl_mechanism.to_ascii_uppercase(),
            username: config.sasl_username.clone().unwrap_or_default(),
            password: SecretString::new(config.sasl_password.clone().unwrap_or_default()),
        });

        Self {
            brokers: config.brokers.clone(),
            client_id: config.client_id.clone(),
            security_protocol: config.security_protocol(),
            tls_ca_file: config.tls_ca_file.clone(),
            tls_cert_file: config.tls_cert_file.clone(),
            tls_key_file: config.tls_key_file.clone(),
            sasl,
            request_timeout: config.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Bootstrap, identity and security properties.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("client.id", &self.client_id)
            .set("security.protocol", self.security_protocol)
            .set(
                "socket.timeout.ms",
                self.request_timeout.as_millis().to_string(),
            );

        if let Some(ref ca_location) = self.tls_ca_file {
            client_config.set("ssl.ca.location", ca_location);
        }
        if let Some(ref cert_location) = self.tls_cert_file {
            client_config.set("ssl.certificate.location", cert_location);
        }
        if let Some(ref key_location) = self.tls_key_file {
            client_config.set("ssl.key.location", key_location);
        }

        if let Some(ref sasl) = self.sasl {
            client_config
                .set("sasl.mechanism", &sasl.mechanism)
                .set("sasl.username", &sasl.username)
                .set("sasl.password", sasl.password.expose_secret());
        }

        client_config
    }

    /// Group consumer that commits automatically and resets to `from`.
    pub fn consumer_config(&self, group_id: &str, from: OffsetPolicy) -> ClientConfig {
        let mut client_config = self.client_config();
        client_config
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            // Offsets are stored per delivered record, so records rewound
            // while paused are never committed.
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", from.as_reset_value())
            .set("enable.partition.eof", "false");
        client_config
    }

    pub fn producer_config(&self) -> ClientConfig {
        let mut client_config = self.client_config();
        client_config
            .set("acks", "all")
            .set("retries", "3")
            .set(
                "message.timeout.ms",
                self.request_timeout.as_millis().to_string(),
            );
        client_config
    }
}

/// Classifies librdkafka failures; broker reachability problems become
/// `Connectivity` so the HTTP layer can answer 503.
pub(super) fn map_kafka_error(error: KafkaError) -> BackendError {
    if let KafkaError::ClientCreation(message) = &error {
        return BackendError::configuration(message.clone());
    }
    match error.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::BrokerNotAvailable
            | RDKafkaErrorCode::NetworkException
            | RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::MessageTimedOut,
        ) => BackendError::connectivity(error.to_string()),
        _ => BackendError::operation(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(config: KafkaConfig) -> KafkaClientSettings {
        KafkaClientSettings::from_config(&config)
    }

    #[test]
    fn plaintext_by_default() {
        let client_config = settings(KafkaConfig::default()).client_config();
        assert_eq!(client_config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(client_config.get("security.protocol"), Some("PLAINTEXT"));
        assert_eq!(client_config.get("client.id"), Some("kafka-observatory"));
        assert_eq!(client_config.get("sasl.username"), None);
    }

    #[test]
    fn tls_and_sasl_properties_are_applied() {
        let client_config = settings(KafkaConfig {
            tls_enabled: true,
            tls_ca_file: Some("/certs/ca.pem".to_string()),
            sasl_enabled: true,
            sasl_mechanism: "plain".to_string(),
            sasl_username: Some("observer".to_string()),
            sasl_password: Some("hunter2".to_string()),
            ..Default::default()
        })
        .client_config();

        assert_eq!(client_config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(client_config.get("ssl.ca.location"), Some("/certs/ca.pem"));
        assert_eq!(client_config.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(client_config.get("sasl.password"), Some("hunter2"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let settings = settings(KafkaConfig {
            sasl_enabled: true,
            sasl_username: Some("observer".to_string()),
            sasl_password: Some("hunter2".to_string()),
            ..Default::default()
        });
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }

    #[test]
    fn consumer_commits_automatically_and_resets_from_policy() {
        let settings = settings(KafkaConfig::default());

        let earliest = settings.consumer_config("grp", OffsetPolicy::Earliest);
        assert_eq!(earliest.get("group.id"), Some("grp"));
        assert_eq!(earliest.get("enable.auto.commit"), Some("true"));
        assert_eq!(earliest.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(earliest.get("auto.offset.reset"), Some("earliest"));

        let latest = settings.consumer_config("grp", OffsetPolicy::Latest);
        assert_eq!(latest.get("auto.offset.reset"), Some("latest"));
    }

    #[test]
    fn producer_waits_for_all_replicas() {
        let producer = settings(KafkaConfig::default()).producer_config();
        assert_eq!(producer.get("acks"), Some("all"));
        assert_eq!(producer.get("retries"), Some("3"));
    }

    #[test]
    fn broker_outages_map_to_connectivity() {
        let error = KafkaError::MetadataFetch(RDKafkaErrorCode::AllBrokersDown);
        assert!(matches!(map_kafka_error(error), BackendError::Connectivity(_)));

        let error = KafkaError::ClientCreation("bad property".to_string());
        assert!(matches!(map_kafka_error(error), BackendError::Configuration(_)));

        let error = KafkaError::MetadataFetch(RDKafkaErrorCode::UnknownTopicOrPartition);
        assert!(matches!(map_kafka_error(error), BackendError::Operation(_)));
    }
}
