//! Ticker-driven idea generation: on each tick, every active user gets a
//! fresh batch of ideas for one randomly chosen active topic.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::llm::LlmClient;
use crate::storage::{topics, users, DbPool};
use crate::usecases::generate_ideas;

/// Per-user tick work is bounded so one slow or hanging LLM call cannot
/// stall the rest of the batch until the next tick.
const PER_USER_TIMEOUT: Duration = Duration::from_secs(120);

/// Run the scheduler loop until `cancel` fires. Each tick visits every
/// active user, generating `config.batch_size` ideas against one randomly
/// selected active topic. A user with no active topics, or whose tick
/// errors, is logged and skipped -- it does not abort the tick.
pub async fn run(pool: DbPool, llm: Arc<LlmClient>, config: SchedulerConfig, cancel: CancellationToken) {
    let interval = Duration::from_secs(config.interval_seconds);
    tracing::info!(interval_secs = config.interval_seconds, batch_size = config.batch_size, "scheduler started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("scheduler stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {
                run_tick(&pool, &llm, config.batch_size, &cancel).await;
            }
        }
    }
}

async fn run_tick(pool: &DbPool, llm: &LlmClient, batch_size: u32, cancel: &CancellationToken) {
    let active_users = match users::find_all_active(pool).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(error = %e, "scheduler tick: failed to list active users");
            return;
        }
    };

    tracing::info!(user_count = active_users.len(), "scheduler tick starting");
    for user in active_users {
        let topic = match topics::find_random_active_by_user_id(pool, &user.id).await {
            Ok(Some(topic)) => topic,
            Ok(None) => {
                tracing::debug!(user_id = %user.id, "no active topics, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to pick topic, skipping");
                continue;
            }
        };

        let work = generate_ideas(pool, llm, cancel, &user.id, &topic.id, Some(batch_size));
        match tokio::time::timeout(PER_USER_TIMEOUT, work).await {
            Ok(Ok(ideas)) => {
                tracing::info!(user_id = %user.id, topic_id = %topic.id, count = ideas.len(), "generated ideas");
            }
            Ok(Err(e)) => {
                tracing::warn!(user_id = %user.id, topic_id = %topic.id, error = %e, "idea generation failed for user");
            }
            Err(_) => {
                tracing::warn!(user_id = %user.id, topic_id = %topic.id, "idea generation timed out for user");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Topic, User};
    use crate::llm::RetryConfig;
    use crate::storage::{init_test_db, ideas};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn tick_generates_ideas_for_every_active_user() {
        let pool = init_test_db().await.unwrap();

        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(&pool, &user).await.unwrap();
        let topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust", 3, 5).unwrap();
        topics::insert(&pool, &topic).await.unwrap();

        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ideas\":[\"a\",\"b\",\"c\"]}"}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let llm = LlmClient::new(
            &server.uri(),
            None,
            "m".to_string(),
            0.5,
            512,
            Duration::from_secs(5),
            RetryConfig { max_retries: 0, ..RetryConfig::default() },
        )
        .unwrap();

        let cancel = CancellationToken::new();
        run_tick(&pool, &llm, 3, &cancel).await;

        let persisted = ideas::find_by_topic_id(&pool, "t1").await.unwrap();
        assert_eq!(persisted.len(), 3);
    }

    #[tokio::test]
    async fn tick_skips_user_with_no_active_topics() {
        let pool = init_test_db().await.unwrap();
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(&pool, &user).await.unwrap();

        let llm = LlmClient::new(
            "http://localhost:1",
            None,
            "m".to_string(),
            0.5,
            512,
            Duration::from_secs(1),
            RetryConfig { max_retries: 0, ..RetryConfig::default() },
        )
        .unwrap();

        let cancel = CancellationToken::new();
        run_tick(&pool, &llm, 3, &cancel).await;
    }
}
