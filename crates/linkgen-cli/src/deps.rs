//! Shared runtime dependencies: the database pool and LLM client every
//! subcommand needs, built once from `Config`.

use linkgen_core::config::Config;
use linkgen_core::llm::{LlmClient, RetryConfig};
use linkgen_core::storage::{self, DbPool};

pub struct RuntimeDeps {
    pub pool: DbPool,
    pub llm: LlmClient,
}

impl RuntimeDeps {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let pool = storage::init_db(
            &config.storage.db_path,
            config.storage.pool_min_size,
            config.storage.pool_max_size,
        )
        .await
        .map_err(|e| anyhow::anyhow!("database initialization failed: {e}"))?;

        let retry = RetryConfig {
            max_retries: config.llm.max_retries,
            ..RetryConfig::default()
        };
        let llm = LlmClient::new(
            &config.llm.endpoint,
            config.llm.api_key.clone(),
            config.llm.model.clone(),
            config.llm.temperature,
            config.llm.max_tokens,
            std::time::Duration::from_secs(config.llm.timeout_secs),
            retry,
        )
        .map_err(|e| anyhow::anyhow!("LLM client construction failed: {e}"))?;

        Ok(Self { pool, llm })
    }
}
