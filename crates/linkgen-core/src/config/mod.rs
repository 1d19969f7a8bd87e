//! Configuration management for the LinkGen engine.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.linkgen/config.toml`)
//! 3. Environment variable overrides (`LINKGEN_` prefix)
//!
//! CLI flag overrides are applied by the binary crate after loading.

mod defaults;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Top-level configuration for the LinkGen engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server binding (consumed by the out-of-scope routing layer).
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Message queue connection settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Scheduler tick settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Deployment environment name (e.g. "development", "production").
    #[serde(default = "default_env")]
    pub env: String,

    /// How long the runtime waits for in-flight tasks to drain on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_env() -> String {
    "development".to_string()
}
fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// HTTP server binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "defaults_server_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "defaults_server_port")]
    pub port: u16,
}

fn defaults_server_host() -> String {
    "127.0.0.1".to_string()
}
fn defaults_server_port() -> u16 {
    8080
}

/// Database connection configuration. Spec names this boundary after
/// MongoDB; this implementation persists through SQLite (see storage::init_db),
/// so the field below is a filesystem path rather than a connection URI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Minimum pool connections.
    #[serde(default = "default_pool_min_size")]
    pub pool_min_size: u32,
    /// Maximum pool connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

fn default_db_path() -> String {
    "~/.linkgen/linkgen.db".to_string()
}
fn default_pool_min_size() -> u32 {
    1
}
fn default_pool_max_size() -> u32 {
    10
}

/// Message-queue transport configuration (NATS).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// NATS server URL.
    #[serde(default = "default_queue_url")]
    pub url: String,
    /// Subject draft-generation jobs are published/consumed on.
    #[serde(default = "default_queue_subject")]
    pub subject: String,
    /// Queue group name shared by consumer replicas.
    #[serde(default = "default_queue_group")]
    pub queue_group: String,
    /// Maximum in-flight messages handled concurrently by one consumer.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Maximum republish attempts before a message is dead-lettered.
    #[serde(default = "default_queue_max_retries")]
    pub max_retries: u32,
}

fn default_queue_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}
fn default_queue_subject() -> String {
    "draft.generate".to_string()
}
fn default_queue_group() -> String {
    "draft-workers".to_string()
}
fn default_max_concurrent() -> usize {
    4
}
fn default_queue_max_retries() -> u32 {
    3
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base endpoint, e.g. `https://api.openai.com`.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model name passed in the chat-completion request.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key for the LLM provider.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum tokens requested per completion.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    /// Maximum retry attempts on transient failure (see `llm::retry`).
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_llm_max_tokens() -> u32 {
    2048
}
fn default_llm_temperature() -> f32 {
    0.7
}
fn default_llm_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout_secs(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            max_retries: default_llm_max_retries(),
        }
    }
}

/// Scheduler tick settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Seconds between ticks. Minimum 60.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Number of ideas generated per user per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_interval_seconds() -> u64 {
    6 * 60 * 60
}
fn default_batch_size() -> u32 {
    5
}

/// Logging and observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter level, e.g. "info", "debug".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with environment variable overrides.
    ///
    /// The loading sequence:
    /// 1. Determine config file path (argument > `LINKGEN_CONFIG` env var > default)
    /// 2. Parse TOML file (or use defaults if the default path doesn't exist)
    /// 3. Apply environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Config, ConfigError> {
        let (path, explicit) = Self::resolve_config_path(config_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError { source: e })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Config::default()
            }
            Err(_) => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration and validate it, returning all validation errors at once.
    pub fn load_and_validate(config_path: Option<&str>) -> Result<Config, Vec<ConfigError>> {
        let config = Config::load(config_path).map_err(|e| vec![e])?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, returning all errors found (not just the first).
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if !(1024..=65535).contains(&self.server.port) {
            errors.push(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "must be between 1024 and 65535".to_string(),
            });
        }

        if self.storage.pool_min_size > self.storage.pool_max_size
            || self.storage.pool_max_size > 1000
        {
            errors.push(ConfigError::InvalidValue {
                field: "storage.pool_min_size/pool_max_size".to_string(),
                message: "must satisfy min <= max <= 1000".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: "must be between 0.0 and 2.0".to_string(),
            });
        }

        if self.llm.api_key.as_deref().unwrap_or("").is_empty() {
            errors.push(ConfigError::MissingField {
                field: "llm.api_key".to_string(),
            });
        }

        if self.llm.timeout_secs == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "llm.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.scheduler.interval_seconds < 60 {
            errors.push(ConfigError::InvalidValue {
                field: "scheduler.interval_seconds".to_string(),
                message: "must be at least 60 seconds".to_string(),
            });
        }

        if !(1..=1000).contains(&self.scheduler.batch_size) {
            errors.push(ConfigError::InvalidValue {
                field: "scheduler.batch_size".to_string(),
                message: "must be between 1 and 1000".to_string(),
            });
        }

        if self.queue.max_concurrent == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "queue.max_concurrent".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.shutdown_timeout_secs == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "shutdown_timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve the config file path from arguments, env vars, or default.
    ///
    /// Returns `(path, explicit)` where `explicit` is true if the path was
    /// explicitly provided (via argument or env var) rather than using the default.
    fn resolve_config_path(config_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(path) = config_path {
            return (expand_tilde(path), true);
        }

        if let Ok(env_path) = env::var("LINKGEN_CONFIG") {
            return (expand_tilde(&env_path), true);
        }

        (expand_tilde("~/.linkgen/config.toml"), false)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables use the `LINKGEN_` prefix with double underscores
    /// separating nested keys (e.g. `LINKGEN_LLM__API_KEY`).
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("LINKGEN_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("LINKGEN_SERVER_PORT") {
            self.server.port = parse_env("LINKGEN_SERVER_PORT", &val)?;
        }

        if let Ok(val) = env::var("LINKGEN_DATABASE") {
            self.storage.db_path = val;
        }
        if let Ok(val) = env::var("LINKGEN_DATABASE_POOL_MIN_SIZE") {
            self.storage.pool_min_size = parse_env("LINKGEN_DATABASE_POOL_MIN_SIZE", &val)?;
        }
        if let Ok(val) = env::var("LINKGEN_DATABASE_POOL_MAX_SIZE") {
            self.storage.pool_max_size = parse_env("LINKGEN_DATABASE_POOL_MAX_SIZE", &val)?;
        }

        if let Ok(val) = env::var("LINKGEN_NATS_URL") {
            self.queue.url = val;
        }
        if let Ok(val) = env::var("LINKGEN_NATS_QUEUE") {
            self.queue.queue_group = val;
        }

        if let Ok(val) = env::var("LINKGEN_LLM_ENDPOINT") {
            self.llm.endpoint = val;
        }
        if let Ok(val) = env::var("LINKGEN_LLM_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = env::var("LINKGEN_LLM_API_KEY") {
            self.llm.api_key = Some(val);
        }
        if let Ok(val) = env::var("LINKGEN_LLM_TIMEOUT") {
            self.llm.timeout_secs = parse_env("LINKGEN_LLM_TIMEOUT", &val)?;
        }
        if let Ok(val) = env::var("LINKGEN_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_env("LINKGEN_LLM_MAX_TOKENS", &val)?;
        }
        if let Ok(val) = env::var("LINKGEN_LLM_TEMPERATURE") {
            self.llm.temperature = parse_env("LINKGEN_LLM_TEMPERATURE", &val)?;
        }

        if let Ok(val) = env::var("LINKGEN_SCHEDULER_INTERVAL") {
            self.scheduler.interval_seconds = parse_env("LINKGEN_SCHEDULER_INTERVAL", &val)?;
        }
        if let Ok(val) = env::var("LINKGEN_SCHEDULER_BATCH_SIZE") {
            self.scheduler.batch_size = parse_env("LINKGEN_SCHEDULER_BATCH_SIZE", &val)?;
        }

        if let Ok(val) = env::var("LINKGEN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LINKGEN_LOG_FORMAT") {
            self.logging.format = val;
        }

        if let Ok(val) = env::var("LINKGEN_ENV") {
            self.env = val;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError> {
    val.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field: key.to_string(),
        message: format!("'{val}' is not a valid value for {key}"),
    })
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_pass_except_missing_api_key() {
        let config = Config::default();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::MissingField { .. }));
    }

    #[test]
    fn valid_config_passes() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.temperature = 2.5;
        let errors = config.validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidValue { field, .. } if field == "llm.temperature")));
    }

    #[test]
    fn rejects_short_scheduler_interval() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.scheduler.interval_seconds = 30;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::InvalidValue { field, .. } if field == "scheduler.interval_seconds")
        ));
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.storage.pool_min_size = 5;
        config.storage.pool_max_size = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_override_applies_llm_api_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("LINKGEN_LLM_API_KEY", "sk-from-env");
        let mut config = Config::default();
        config.apply_env_overrides().expect("env override");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-from-env"));
        env::remove_var("LINKGEN_LLM_API_KEY");
    }

    #[test]
    fn env_override_rejects_unparsable_port() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("LINKGEN_SERVER_PORT", "not-a-number");
        let mut config = Config::default();
        let result = config.apply_env_overrides();
        assert!(result.is_err());
        env::remove_var("LINKGEN_SERVER_PORT");
    }
}
