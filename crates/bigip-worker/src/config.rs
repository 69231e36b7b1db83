//! Configuration for the BigIP worker.

use crate::error::{WorkerError, WorkerResult};
use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis connection URL
    pub redis_url: String,

    /// Stream the worker consumes command messages from
    pub command_stream: String,

    /// Stream status replies go to when a message names no reply stream
    pub reply_stream: String,

    /// Stream for human-facing notifications
    pub notify_stream: String,

    /// Consumer group name
    pub consumer_group: String,

    /// Consumer name (unique per instance)
    pub consumer_name: String,

    /// XREADGROUP block timeout in milliseconds
    pub block_timeout_ms: u64,

    /// Path or name of the device-control program
    pub bigip_path: String,

    /// Timeout for a single device command
    pub executor_timeout: Duration,

    /// Directory for per-request output logs
    pub output_dir: PathBuf,
}

impl Default for WorkerConfig {
    /// Built-in defaults, without reading the environment.
    fn default() -> Self {
        let command_stream = "bigip:commands".to_string();
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            reply_stream: format!("{}:replies", command_stream),
            command_stream,
            notify_stream: "bigip:notifications".to_string(),
            consumer_group: "bigip-worker".to_string(),
            consumer_name: format!("bigip-worker-{}", uuid::Uuid::new_v4()),
            block_timeout_ms: 5000,
            bigip_path: "bigip".to_string(),
            executor_timeout: Duration::from_secs(120),
            output_dir: std::env::temp_dir().join("bigip-worker").join("output"),
        }
    }
}

impl WorkerConfig {
    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(redis_url) = lookup("REDIS_URL") {
            config.redis_url = redis_url;
        }
        if let Some(command_stream) = lookup("BIGIP_COMMAND_STREAM") {
            config.set_command_stream(command_stream);
        }
        if let Some(reply_stream) = lookup("BIGIP_REPLY_STREAM") {
            config.reply_stream = reply_stream;
        }
        if let Some(notify_stream) = lookup("BIGIP_NOTIFY_STREAM") {
            config.notify_stream = notify_stream;
        }
        if let Some(ms) = lookup("BIGIP_BLOCK_MS").and_then(|s| s.parse().ok()) {
            config.block_timeout_ms = ms;
        }
        if let Some(bigip_path) = lookup("BIGIP_PATH") {
            config.bigip_path = bigip_path;
        }
        if let Some(secs) = lookup("BIGIP_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.executor_timeout = Duration::from_secs(secs);
        }
        if let Some(output_dir) = lookup("BIGIP_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Change the command stream. The reply stream follows it; set an
    /// explicit reply stream afterwards to override.
    pub fn set_command_stream(&mut self, command_stream: String) {
        self.reply_stream = format!("{}:replies", command_stream);
        self.command_stream = command_stream;
    }

    /// Check values that would make the worker unusable.
    pub fn validate(&self) -> WorkerResult<()> {
        for (name, value) in [
            ("redis_url", &self.redis_url),
            ("command_stream", &self.command_stream),
            ("reply_stream", &self.reply_stream),
            ("notify_stream", &self.notify_stream),
            ("bigip_path", &self.bigip_path),
        ] {
            if value.trim().is_empty() {
                return Err(WorkerError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.executor_timeout.is_zero() {
            return Err(WorkerError::Config(
                "executor timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> WorkerResult<WorkerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_with(&[]).unwrap();

        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.command_stream, "bigip:commands");
        assert_eq!(config.reply_stream, "bigip:commands:replies");
        assert_eq!(config.notify_stream, "bigip:notifications");
        assert_eq!(config.consumer_group, "bigip-worker");
        assert!(config.consumer_name.starts_with("bigip-worker-"));
        assert_eq!(config.block_timeout_ms, 5000);
        assert_eq!(config.bigip_path, "bigip");
        assert_eq!(config.executor_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_overrides() {
        let config = config_with(&[
            ("REDIS_URL", "redis://lb-queue:6380"),
            ("BIGIP_COMMAND_STREAM", "lb:jobs"),
            ("BIGIP_TIMEOUT_SECS", "30"),
            ("BIGIP_OUTPUT_DIR", "/var/log/bigip"),
        ])
        .unwrap();

        assert_eq!(config.redis_url, "redis://lb-queue:6380");
        assert_eq!(config.command_stream, "lb:jobs");
        assert_eq!(config.reply_stream, "lb:jobs:replies");
        assert_eq!(config.executor_timeout, Duration::from_secs(30));
        assert_eq!(config.output_dir, PathBuf::from("/var/log/bigip"));
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_with(&[("BIGIP_BLOCK_MS", "soon")]).unwrap();
        assert_eq!(config.block_timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_with(&[("BIGIP_PATH", " ")]),
            Err(WorkerError::Config(_))
        ));
        assert!(matches!(
            config_with(&[("BIGIP_TIMEOUT_SECS", "0")]),
            Err(WorkerError::Config(_))
        ));
    }

    #[test]
    fn test_default_is_unvalidated_and_env_free() {
        let mut config = WorkerConfig::default();
        config.executor_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config.executor_timeout = Duration::from_secs(30);
        config.set_command_stream("lb:jobs".to_string());
        assert_eq!(config.reply_stream, "lb:jobs:replies");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_reply_stream_wins() {
        let config = config_with(&[
            ("BIGIP_REPLY_STREAM", "lb:answers"),
            ("BIGIP_COMMAND_STREAM", "lb:jobs"),
        ])
        .unwrap();
        assert_eq!(config.reply_stream, "lb:answers");
    }

    #[test]
    fn test_consumer_names_are_unique() {
        let a = config_with(&[]).unwrap();
        let b = config_with(&[]).unwrap();
        assert_ne!(a.consumer_name, b.consumer_name);
    }
}
