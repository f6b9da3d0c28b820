// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API endpoint returning randomized user profiles
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Maximum outbound API calls per minute
    #[serde(default = "defaults::api_calls_per_minute")]
    pub api_calls_per_minute: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Inclusive range of users requested per API call (`size` parameter)
    #[serde(default = "defaults::users_per_call")]
    pub users_per_call: (u32, u32),

    /// Inclusive range of API calls performed per fetch cycle
    #[serde(default = "defaults::calls_per_fetch")]
    pub calls_per_fetch: (u32, u32),

    /// DynamoDB table holding fetched users
    #[serde(default = "defaults::table_name")]
    pub table_name: String,

    /// SQS dead-letter queue for failed operations
    #[serde(default = "defaults::queue_name")]
    pub queue_name: String,

    /// Durable event log settings
    #[serde(default)]
    pub log: LogConfig,
}

/// CloudWatch Logs group, stream, and retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log group name
    #[serde(default = "defaults::log_group")]
    pub group: String,

    /// Retention period for the log group, in days
    #[serde(default = "defaults::retention_days")]
    pub retention_days: i32,

    /// Log stream names, one per channel
    #[serde(default)]
    pub streams: StreamNames,
}

/// Names of the three event channels' log streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamNames {
    #[serde(default = "defaults::info_stream")]
    pub info: String,
    #[serde(default = "defaults::error_stream")]
    pub error: String,
    #[serde(default = "defaults::status_stream")]
    pub status: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Build configuration from environment variables over the defaults.
    ///
    /// Used by the Lambda entry point, where there is no config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("USERS_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("USERS_TABLE") {
            config.table_name = v;
        }
        if let Ok(v) = std::env::var("DLQ_QUEUE") {
            config.queue_name = v;
        }
        if let Ok(v) = std::env::var("LOG_GROUP") {
            config.log.group = v;
        }
        if let Ok(v) = std::env::var("API_CALLS_PER_MINUTE") {
            match v.parse() {
                Ok(n) => config.api_calls_per_minute = n,
                Err(e) => warn!("Ignoring API_CALLS_PER_MINUTE={v}: {e}"),
            }
        }
        config
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AppError::validation("endpoint is empty"));
        }
        if self.api_calls_per_minute == 0 {
            return Err(AppError::validation("api_calls_per_minute must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation("timeout_secs must be > 0"));
        }
        if self.users_per_call.0 == 0 || self.users_per_call.0 > self.users_per_call.1 {
            return Err(AppError::validation(
                "users_per_call must be an inclusive range with min >= 1",
            ));
        }
        if self.calls_per_fetch.0 == 0 || self.calls_per_fetch.0 > self.calls_per_fetch.1 {
            return Err(AppError::validation(
                "calls_per_fetch must be an inclusive range with min >= 1",
            ));
        }
        if self.table_name.trim().is_empty() {
            return Err(AppError::validation("table_name is empty"));
        }
        if self.queue_name.trim().is_empty() {
            return Err(AppError::validation("queue_name is empty"));
        }
        if self.log.retention_days <= 0 {
            return Err(AppError::validation("log.retention_days must be > 0"));
        }
        if self.log.group.trim().is_empty() {
            return Err(AppError::validation("log.group is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            api_calls_per_minute: defaults::api_calls_per_minute(),
            timeout_secs: defaults::timeout(),
            users_per_call: defaults::users_per_call(),
            calls_per_fetch: defaults::calls_per_fetch(),
            table_name: defaults::table_name(),
            queue_name: defaults::queue_name(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            group: defaults::log_group(),
            retention_days: defaults::retention_days(),
            streams: StreamNames::default(),
        }
    }
}

impl Default for StreamNames {
    fn default() -> Self {
        Self {
            info: defaults::info_stream(),
            error: defaults::error_stream(),
            status: defaults::status_stream(),
        }
    }
}

mod defaults {
    pub fn endpoint() -> String {
        "https://random-data-api.com/api/v2/users".to_string()
    }

    pub fn api_calls_per_minute() -> u32 {
        75
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn users_per_call() -> (u32, u32) {
        (1, 150)
    }

    pub fn calls_per_fetch() -> (u32, u32) {
        (1, 20)
    }

    pub fn table_name() -> String {
        "users".to_string()
    }

    pub fn queue_name() -> String {
        "dlq".to_string()
    }

    pub fn log_group() -> String {
        "DailyAIDataFetcher".to_string()
    }

    pub fn retention_days() -> i32 {
        30
    }

    pub fn info_stream() -> String {
        "Info".to_string()
    }

    pub fn error_stream() -> String {
        "Error".to_string()
    }

    pub fn status_stream() -> String {
        "Status".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_calls_per_minute, 75);
        assert_eq!(config.users_per_call, (1, 150));
        assert_eq!(config.calls_per_fetch, (1, 20));
        assert_eq!(config.log.streams.status, "Status");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            endpoint = "http://localhost:9000/users"
            calls_per_fetch = [2, 2]

            [log]
            group = "TestGroup"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:9000/users");
        assert_eq!(config.calls_per_fetch, (2, 2));
        assert_eq!(config.log.group, "TestGroup");
        // Untouched fields keep their defaults.
        assert_eq!(config.table_name, "users");
        assert_eq!(config.log.retention_days, 30);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        config.users_per_call = (10, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_calls_per_minute() {
        let mut config = Config::default();
        config.api_calls_per_minute = 0;
        assert!(config.validate().is_err());
    }
}
