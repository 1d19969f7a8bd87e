//! Implementation of the `linkgen serve` command: the long-running daemon
//! mode. Spawns the scheduler tick loop and the draft-generation queue
//! consumer under one `Runtime`, and blocks until a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use linkgen_core::config::Config;
use linkgen_core::error::WorkflowError;
use linkgen_core::queue::{Consumer, ConsumerConfig, DraftGenerationMessage};
use linkgen_core::runtime::Runtime;
use linkgen_core::{scheduler, usecases};

use crate::deps::RuntimeDeps;

pub async fn execute(config: &Config) -> anyhow::Result<()> {
    let deps = RuntimeDeps::build(config).await?;
    let pool = deps.pool;
    let llm = Arc::new(deps.llm);

    let stream_name = format!("{}-stream", config.queue.subject.replace('.', "-"));
    let consumer_config = ConsumerConfig {
        subject: config.queue.subject.clone(),
        queue_group: config.queue.queue_group.clone(),
        max_concurrent: config.queue.max_concurrent,
        max_retries: config.queue.max_retries,
        per_message_timeout: Duration::from_secs(config.llm.timeout_secs * 3),
    };
    let consumer = Consumer::connect(&config.queue.url, &stream_name, pool.clone(), consumer_config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect draft-generation consumer: {e}"))?;

    let mut runtime = Runtime::with_shutdown_timeout(Duration::from_secs(config.shutdown_timeout_secs));

    {
        let pool = pool.clone();
        let llm = llm.clone();
        let scheduler_config = config.scheduler.clone();
        let cancel = runtime.cancel_token();
        runtime.spawn("scheduler", async move {
            scheduler::run(pool, llm, scheduler_config, cancel).await;
        });
    }

    {
        let handler_pool = pool.clone();
        let handler_llm = llm.clone();
        let cancel = runtime.cancel_token();
        runtime.spawn("draft-consumer", async move {
            let handler_pool = handler_pool.clone();
            let handler_llm = handler_llm.clone();
            let handler = Arc::new(move |job: DraftGenerationMessage, cancel| {
                let pool = handler_pool.clone();
                let llm = handler_llm.clone();
                Box::pin(async move { handle_job(pool, llm, job, cancel).await })
                    as std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), WorkflowError>> + Send>>
            });

            if let Err(e) = consumer.run(handler, cancel).await {
                tracing::error!(error = %e, "draft-generation consumer stopped with an error");
            }
        });
    }

    tracing::info!(tasks = runtime.task_count(), "serve: all tasks spawned, running until shutdown");
    runtime.run_until_shutdown().await;
    tracing::info!("serve: shutdown complete");
    Ok(())
}

async fn handle_job(
    pool: linkgen_core::storage::DbPool,
    llm: Arc<linkgen_core::llm::LlmClient>,
    job: DraftGenerationMessage,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<(), WorkflowError> {
    let idea_id = job
        .idea_id
        .as_deref()
        .ok_or_else(|| WorkflowError::InvalidInput("queued job is missing idea_id".to_string()))?;
    usecases::generate_drafts(&pool, &llm, &cancel, &job.user_id, idea_id).await?;
    Ok(())
}
