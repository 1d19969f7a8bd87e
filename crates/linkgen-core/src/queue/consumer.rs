//! Queue-group consumer: bounded-concurrency dispatch with retry/dead-letter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::{QueueError, WorkflowError};
use crate::storage::job_errors::{self, JobError};
use crate::storage::DbPool;

use super::message::DraftGenerationMessage;
use super::publisher::Publisher;

/// A handler invocation result classifies the queue-level retry decision.
/// LLM-layer transient failures are retryable at the queue level (they
/// survived the LLM client's own retry budget and may still succeed on a
/// fresh message); every other use-case error is dead-lettered immediately.
fn is_retryable(err: &WorkflowError) -> bool {
    matches!(err, WorkflowError::Llm(_))
}

fn error_stage(err: &WorkflowError) -> &'static str {
    match err {
        WorkflowError::Llm(_) => "draft_generation",
        WorkflowError::Domain(_) => "domain_validation",
        WorkflowError::Storage(_) => "persistence",
        WorkflowError::Template(_) => "prompt_rendering",
        WorkflowError::InvalidInput(_) => "input_validation",
    }
}

fn error_detail(err: &WorkflowError) -> (String, Option<String>, Option<String>) {
    if let WorkflowError::Llm(crate::error::LlmError::ResponseError {
        prompt,
        raw_response,
        detail,
        ..
    }) = err
    {
        return (detail.clone(), Some(raw_response.clone()), Some(prompt.clone()));
    }
    (err.to_string(), None, None)
}

/// The per-message unit of work: generate drafts for one queued job.
/// Returned as a boxed future so the consumer stays decoupled from the
/// use-case layer's concrete signature.
pub type DraftHandler = Arc<
    dyn Fn(DraftGenerationMessage, CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), WorkflowError>> + Send>>
        + Send
        + Sync,
>;

/// Consumer configuration mirrors `config::QueueConfig`.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub subject: String,
    pub queue_group: String,
    pub max_concurrent: usize,
    pub max_retries: u32,
    pub per_message_timeout: Duration,
}

/// A running queue-group consumer bound to a JetStream pull consumer.
pub struct Consumer {
    consumer: async_nats::jetstream::consumer::PullConsumer,
    publisher: Publisher,
    pool: DbPool,
    config: ConsumerConfig,
}

impl Consumer {
    /// Connect and ensure the backing stream/durable consumer exist.
    pub async fn connect(
        nats_url: &str,
        stream_name: &str,
        pool: DbPool,
        config: ConsumerConfig,
    ) -> Result<Self, QueueError> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        let jetstream = async_nats::jetstream::new(client);

        let stream = jetstream
            .get_or_create_stream(async_nats::jetstream::stream::Config {
                name: stream_name.to_string(),
                subjects: vec![config.subject.clone()],
                ..Default::default()
            })
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        let consumer = stream
            .get_or_create_consumer(
                &config.queue_group,
                async_nats::jetstream::consumer::pull::Config {
                    durable_name: Some(config.queue_group.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        let publisher = Publisher::connect(nats_url, stream_name, &config.subject).await?;

        Ok(Self { consumer, publisher, pool, config })
    }

    /// Drain messages until `cancel` fires, dispatching each to `handler`
    /// under a semaphore bounding in-flight work to `max_concurrent`. On
    /// cancellation, stops pulling new messages and waits for in-flight
    /// handlers to finish (bounded by the caller's overall shutdown timeout).
    pub async fn run(&self, handler: DraftHandler, cancel: CancellationToken) -> Result<(), QueueError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut messages = self
            .consumer
            .messages()
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        let mut in_flight = Vec::new();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = messages.next() => next,
            };

            let Some(delivery) = next else { break };
            let message = match delivery {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "error pulling queue message");
                    continue;
                }
            };

            let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore closed");
            let handler = Arc::clone(&handler);
            let publisher = self.publisher.clone();
            let pool = self.pool.clone();
            let config = self.config.clone();
            let cancel = cancel.clone();

            in_flight.push(tokio::spawn(async move {
                handle_one(message, handler, &publisher, &pool, &config, cancel, permit).await;
            }));
            in_flight.retain(|h| !h.is_finished());
        }

        for handle in in_flight {
            let _ = handle.await;
        }
        Ok(())
    }
}

/// Backoff between republishes follows the same exponential schedule used
/// by the LLM client's own retry executor (`RetryConfig::default`).
fn republish_delay(retry_count: u32) -> Duration {
    let initial = Duration::from_millis(500);
    let max = Duration::from_secs(30);
    let scaled = initial.as_secs_f64() * 2.0_f64.powi(retry_count as i32);
    Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
}

async fn handle_one(
    message: async_nats::jetstream::Message,
    handler: DraftHandler,
    publisher: &Publisher,
    pool: &DbPool,
    config: &ConsumerConfig,
    cancel: CancellationToken,
    _permit: tokio::sync::OwnedSemaphorePermit,
) {
    let decoded: Result<DraftGenerationMessage, _> = serde_json::from_slice(&message.payload);
    let job = match decoded {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(error = %e, "poison message, recording decode failure");
            let _ = message.ack().await;
            return;
        }
    };

    let per_msg_cancel = cancel.clone();
    let timeout = config.per_message_timeout;
    let result = tokio::time::timeout(timeout, handler(job.clone(), per_msg_cancel)).await;

    let outcome = match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(_) => Some(WorkflowError::InvalidInput("per-message timeout exceeded".to_string())),
    };

    let Some(err) = outcome else {
        let _ = message.ack().await;
        return;
    };

    if is_retryable(&err) && job.retry_count < config.max_retries {
        let delay = republish_delay(job.retry_count);
        tokio::time::sleep(delay).await;

        let retried = job.next_attempt();
        if let Err(publish_err) = publisher.publish(&retried).await {
            tracing::error!(error = %publish_err, job_id = %job.job_id, "failed to republish retryable job");
        }
        let _ = message.ack().await;
        return;
    }

    let (detail, raw_response, prompt) = error_detail(&err);
    let job_error = JobError::new(
        job.job_id.to_string(),
        job.user_id.clone(),
        job.idea_id.clone(),
        error_stage(&err),
        detail,
        raw_response,
        prompt,
        job.retry_count + 1,
    );
    if let Err(e) = job_errors::insert(pool, &job_error).await {
        tracing::error!(error = %e, job_id = %job.job_id, "failed to persist job error");
    }
    let _ = message.ack().await;
}
