//! Draft-refinement use-case: apply a user revision instruction via the LLM
//! and append it to the draft's refinement history.

use tokio_util::sync::CancellationToken;

use crate::domain::Draft;
use crate::error::{DomainError, WorkflowError};
use crate::llm::LlmClient;
use crate::storage::{drafts, DbPool};

/// Maximum number of refinement rounds a single draft may accumulate.
/// Chosen to bound unbounded LLM spend on a single draft while leaving
/// headroom for a realistic editing back-and-forth.
pub const MAX_REFINEMENTS: usize = 10;

pub async fn refine_draft(
    pool: &DbPool,
    llm: &LlmClient,
    cancel: &CancellationToken,
    draft_id: &str,
    user_prompt: &str,
) -> Result<Draft, WorkflowError> {
    if user_prompt.trim().is_empty() {
        return Err(WorkflowError::InvalidInput("user_prompt must not be empty".to_string()));
    }

    let mut draft = drafts::find_by_id(pool, draft_id)
        .await?
        .ok_or_else(|| DomainError::DraftNotFound(draft_id.to_string()))?;

    if !draft.status.can_refine() {
        return Err(DomainError::InvalidTransition {
            from: draft.status.to_string(),
            to: crate::domain::DraftStatus::Refined.to_string(),
        }
        .into());
    }

    if draft.refinement_history.len() >= MAX_REFINEMENTS {
        return Err(DomainError::RefinementLimitExceeded {
            draft_id: draft_id.to_string(),
            limit: MAX_REFINEMENTS as u32,
        }
        .into());
    }

    let history: Vec<String> = draft.refinement_history.iter().map(|e| e.content.clone()).collect();
    let revised = llm.refine_draft(cancel, &draft.content, user_prompt, &history).await?;

    draft.append_refinement(user_prompt.to_string(), revised)?;
    drafts::update(pool, &draft).await?;
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DraftStatus, Idea, Topic, User};
    use crate::llm::RetryConfig;
    use crate::storage::{ideas, init_test_db, topics, users};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

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

    async fn seed_draft(pool: &DbPool) -> Draft {
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(pool, &user).await.unwrap();
        let topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust", 5, 5).unwrap();
        topics::insert(pool, &topic).await.unwrap();
        let idea = Idea::new("i1".to_string(), "u1".to_string(), "t1".to_string(), "an idea about async runtimes").unwrap();
        ideas::insert_batch(pool, &[idea]).await.unwrap();

        let draft = Draft::new_post_draft_from_idea(
            "d1".to_string(),
            "u1".to_string(),
            "i1".to_string(),
            "some reasonably long original draft content here",
        )
        .unwrap();
        drafts::insert(pool, &draft).await.unwrap();
        draft
    }

    #[tokio::test]
    async fn refine_draft_appends_history_and_transitions_to_refined() {
        let pool = init_test_db().await.unwrap();
        seed_draft(&pool).await;

        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "a revised, reasonably long piece of content here"}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let refined = refine_draft(&pool, &client, &cancel, "d1", "make it punchier").await.unwrap();
        assert_eq!(refined.status, DraftStatus::Refined);
        assert_eq!(refined.refinement_history.len(), 1);
    }

    #[tokio::test]
    async fn refine_draft_rejects_published() {
        let pool = init_test_db().await.unwrap();
        let mut draft = seed_draft(&pool).await;
        draft.transition_to(DraftStatus::Published).unwrap();
        drafts::update(&pool, &draft).await.unwrap();

        let client = client_for("http://localhost:1".to_string());
        let cancel = CancellationToken::new();
        let result = refine_draft(&pool, &client, &cancel, "d1", "tweak it").await;
        assert!(matches!(result, Err(WorkflowError::Domain(DomainError::InvalidTransition { .. }))));
    }
}
