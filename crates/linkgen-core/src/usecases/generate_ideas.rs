//! Idea-generation use-case: Prompt Engine -> LLM Client -> Idea batch insert.

use tokio_util::sync::CancellationToken;

use crate::domain::{Idea, ObjectId};
use crate::error::{DomainError, WorkflowError};
use crate::llm::LlmClient;
use crate::prompt_engine;
use crate::storage::{ideas, topics, users, DbPool};

/// Default name looked up when a topic has no preferred prompt template.
const DEFAULT_IDEAS_PROMPT_NAME: &str = "default";

/// Generate ideas for one (user, topic) pair: resolve the topic's ideas
/// template, render it, call the LLM, and persist the parsed ideas.
/// `count` defaults to `topic.ideas_count` when the caller passes `None`.
pub async fn generate_ideas(
    pool: &DbPool,
    llm: &LlmClient,
    cancel: &CancellationToken,
    user_id: &str,
    topic_id: &str,
    count: Option<u32>,
) -> Result<Vec<Idea>, WorkflowError> {
    if user_id.trim().is_empty() || topic_id.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(
            "user_id and topic_id must not be empty".to_string(),
        ));
    }

    let user = users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| DomainError::UserNotFound(user_id.to_string()))?;

    let topic = topics::find_by_id(pool, topic_id)
        .await?
        .ok_or_else(|| DomainError::TopicNotFound(topic_id.to_string()))?;
    if topic.user_id != user_id {
        return Err(DomainError::Unauthorized(topic_id.to_string()).into());
    }

    let count = count.unwrap_or(topic.ideas_count);

    let prompt_name = topic.prompt.clone().unwrap_or_else(|| DEFAULT_IDEAS_PROMPT_NAME.to_string());
    let rendered = prompt_engine::process_prompt(
        pool,
        user_id,
        &prompt_name,
        crate::domain::PromptType::Ideas,
        Some(&topic),
        None,
        &user,
    )
    .await?;

    let raw = llm.send_request(cancel, &rendered).await?;
    let parsed = crate::llm::parsing::parse_ideas_response(&raw)?;

    let new_ideas: Vec<Idea> = parsed
        .ideas
        .into_iter()
        .take(count as usize)
        .filter(|content| !content.trim().is_empty())
        .map(|content| Idea::new(ObjectId::generate().to_string(), user_id.to_string(), topic_id.to_string(), &content))
        .collect::<Result<Vec<_>, _>>()?;

    ideas::insert_batch(pool, &new_ideas).await?;
    Ok(new_ideas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Topic, User};
    use crate::llm::RetryConfig;
    use crate::storage::init_test_db;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seed(pool: &DbPool) -> Topic {
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(pool, &user).await.unwrap();
        let topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust async", 5, 5).unwrap();
        topics::insert(pool, &topic).await.unwrap();
        topic
    }

    fn client_for(base_url: String) -> LlmClient {
        LlmClient::new(
            &base_url,
            None,
            "m".to_string(),
            0.5,
            512,
            std::time::Duration::from_secs(5),
            RetryConfig { max_retries: 0, ..RetryConfig::default() },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn generate_ideas_happy_path_persists_five_rows() {
        let pool = init_test_db().await.unwrap();
        seed(&pool).await;

        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ideas\":[\"a\",\"b\",\"c\",\"d\",\"e\"]}"}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let produced = generate_ideas(&pool, &client, &cancel, "u1", "t1", None).await.unwrap();
        assert_eq!(produced.len(), 5);
        assert!(produced.iter().all(|i| !i.used));
    }

    #[tokio::test]
    async fn rejects_topic_owned_by_another_user() {
        let pool = init_test_db().await.unwrap();
        seed(&pool).await;
        let other = User::new("u2".to_string(), "c@d.com".to_string()).unwrap();
        users::insert(&pool, &other).await.unwrap();

        let client = client_for("http://localhost:1".to_string());
        let cancel = CancellationToken::new();
        let result = generate_ideas(&pool, &client, &cancel, "u2", "t1", None).await;
        assert!(matches!(result, Err(WorkflowError::Domain(DomainError::Unauthorized(_)))));
    }
}
