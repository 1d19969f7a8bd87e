//! Default values for all configuration sections.
//!
//! These defaults let the engine start with nothing but an LLM API key
//! supplied; every other knob has a sane out-of-the-box value.

use super::{Config, QueueConfig, SchedulerConfig, ServerConfig, StorageConfig};

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            queue: QueueConfig::default(),
            llm: super::LlmConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: super::LoggingConfig::default(),
            env: super::default_env(),
            shutdown_timeout_secs: super::default_shutdown_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.linkgen/linkgen.db".to_string(),
            pool_min_size: 1,
            pool_max_size: 10,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            subject: "draft.generate".to_string(),
            queue_group: "draft-workers".to_string(),
            max_concurrent: 4,
            max_retries: 3,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 6 * 60 * 60,
            batch_size: 5,
        }
    }
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}
