//! Consume-session configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Limits and timings for consume sessions
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Buffer size when a request omits `maxBufferSize`
    #[serde(default = "default_max_buffer_size")]
    pub default_max_buffer_size: usize,

    /// Largest `maxBufferSize` a request may ask for
    #[serde(default = "default_max_buffer_size_limit")]
    pub max_buffer_size_limit: usize,

    /// Messages returned when `limit` is omitted
    #[serde(default = "default_messages_limit")]
    pub default_messages_limit: usize,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_idle_check_interval")]
    pub idle_check_interval_secs: u64,

    /// Upper bound on one consumer poll
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Per-viewer outbound queue; records are dropped for a viewer when full
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,

    #[serde(default = "default_group_id_prefix")]
    pub group_id_prefix: String,

    /// How long stopped sessions stay queryable; 0 keeps them forever
    #[serde(default)]
    pub terminated_retention_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn idle_check_interval(&self) -> Duration {
        Duration::from_secs(self.idle_check_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn terminated_retention(&self) -> Option<Duration> {
        (self.terminated_retention_secs > 0)
            .then(|| Duration::from_secs(self.terminated_retention_secs))
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            (self.default_max_buffer_size as u64, "session.default_max_buffer_size"),
            (self.max_buffer_size_limit as u64, "session.max_buffer_size_limit"),
            (self.default_messages_limit as u64, "session.default_messages_limit"),
            (self.idle_timeout_secs, "session.idle_timeout_secs"),
            (self.idle_check_interval_secs, "session.idle_check_interval_secs"),
            (self.fetch_timeout_ms, "session.fetch_timeout_ms"),
            (self.subscriber_queue_capacity as u64, "session.subscriber_queue_capacity"),
        ];
        if let Some((_, name)) = positive.iter().find(|(value, _)| *value == 0) {
            return Err(ValidationError::MustBePositive(*name));
        }
        if self.default_max_buffer_size > self.max_buffer_size_limit {
            return Err(ValidationError::BufferDefaultExceedsLimit {
                default: self.default_max_buffer_size,
                limit: self.max_buffer_size_limit,
            });
        }
        if self.group_id_prefix.trim().is_empty() {
            return Err(ValidationError::MissingRequired("SESSION_GROUP_ID_PREFIX"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_max_buffer_size: default_max_buffer_size(),
            max_buffer_size_limit: default_max_buffer_size_limit(),
            default_messages_limit: default_messages_limit(),
            idle_timeout_secs: default_idle_timeout(),
            idle_check_interval_secs: default_idle_check_interval(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
            group_id_prefix: default_group_id_prefix(),
            terminated_retention_secs: 0,
        }
    }
}

fn default_max_buffer_size() -> usize {
    500
}

fn default_max_buffer_size_limit() -> usize {
    10_000
}

fn default_messages_limit() -> usize {
    100
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_idle_check_interval() -> u64 {
    60
}

fn default_fetch_timeout_ms() -> u64 {
    500
}

fn default_subscriber_queue_capacity() -> usize {
    256
}

fn default_group_id_prefix() -> String {
    "kafka-observatory".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.default_max_buffer_size, 500);
        assert_eq!(config.max_buffer_size_limit, 10_000);
        assert_eq!(config.default_messages_limit, 100);
        assert_eq!(config.idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.idle_check_interval(), Duration::from_secs(60));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(500));
        assert_eq!(config.terminated_retention(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retention_enabled_when_positive() {
        let config = SessionConfig {
            terminated_retention_secs: 600,
            ..Default::default()
        };
        assert_eq!(config.terminated_retention(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = SessionConfig {
            fetch_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("session.fetch_timeout_ms"))
        );
    }

    #[test]
    fn test_default_buffer_must_fit_limit() {
        let config = SessionConfig {
            default_max_buffer_size: 20_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::BufferDefaultExceedsLimit { .. })
        ));
    }
}
