//! Configuration management for flightgraph.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`FLIGHTGRAPH__` prefix, `__` separator)
//! 2. Config file (`flightgraph.toml` by default)
//! 3. Defaults
//!
//! `FLIGHT_PASS` is honoured as the Neo4j password when none is configured.

use serde::Deserialize;

use crate::error::FlightError;
use crate::form::FormDecoding;

/// Environment variable read when no password is configured.
pub const PASSWORD_ENV: &str = "FLIGHT_PASS";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightConfig {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub form: FormSettings,
}

/// Connection settings for the Neo4j store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Size of the Bolt connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Retry policy for transient store failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubled for each later attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSettings {
    #[serde(default)]
    pub decoding: FormDecoding,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: String::new(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl FlightConfig {
    /// Load configuration from `<file_prefix>.{toml,yaml,json}` (optional) and
    /// the environment.
    pub fn load(file_prefix: &str) -> Result<Self, FlightError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("FLIGHTGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: FlightConfig = cfg.try_deserialize()?;
        if loaded.neo4j.password.is_empty() {
            if let Ok(password) = std::env::var(PASSWORD_ENV) {
                loaded.neo4j.password = password;
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FlightConfig::default();
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.neo4j.max_connections, 16);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.form.decoding, FormDecoding::Legacy);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flights.toml");
        std::fs::write(
            &path,
            r#"
[neo4j]
uri = "neo4j+s://example.databases.neo4j.io"
password = "secret"

[retry]
max_attempts = 5

[form]
decoding = "standard"
"#,
        )
        .unwrap();

        let prefix = dir.path().join("flights");
        let config = FlightConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.neo4j.uri, "neo4j+s://example.databases.neo4j.io");
        assert_eq!(config.neo4j.password, "secret");
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.form.decoding, FormDecoding::Standard);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = FlightConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.neo4j.fetch_size, 256);
    }
}
