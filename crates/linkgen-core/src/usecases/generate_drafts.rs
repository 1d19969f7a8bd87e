//! Draft-generation use-case: idea -> five post drafts + one article draft.

use tokio_util::sync::CancellationToken;

use crate::domain::{Draft, ObjectId, PromptType};
use crate::error::{DomainError, WorkflowError};
use crate::llm::{parsing, LlmClient};
use crate::prompt_engine;
use crate::storage::{drafts, ideas, prompts, users, DbPool};

/// Given (user_id, idea_id), produce five post drafts and one article draft,
/// persist them, and mark the idea used. Mark-idea-used failure is logged
/// and swallowed: the drafts are already safely persisted (see module docs
/// on partial success).
pub async fn generate_drafts(
    pool: &DbPool,
    llm: &LlmClient,
    cancel: &CancellationToken,
    user_id: &str,
    idea_id: &str,
) -> Result<Vec<Draft>, WorkflowError> {
    if user_id.trim().is_empty() {
        return Err(WorkflowError::InvalidInput("user_id must not be empty".to_string()));
    }
    ObjectId::parse(idea_id)
        .map_err(|e| WorkflowError::InvalidInput(format!("idea_id is not a valid id: {e}")))?;

    let user = users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| DomainError::UserNotFound(user_id.to_string()))?;

    let idea = ideas::find_by_id(pool, idea_id)
        .await?
        .ok_or_else(|| DomainError::IdeaNotFound(idea_id.to_string()))?;
    if idea.user_id != user_id {
        return Err(DomainError::Unauthorized(idea_id.to_string()).into());
    }
    idea.check_usable()?;

    let active_drafts_prompt = prompts::find_active_by_user_id_and_type(pool, user_id, PromptType::Drafts)
        .await?
        .into_iter()
        .next();

    let raw = if let Some(active) = active_drafts_prompt {
        let rendered = prompt_engine::process_prompt(
            pool,
            user_id,
            &active.name,
            PromptType::Drafts,
            None,
            Some(&idea),
            &user,
        )
        .await?;
        llm.send_request(cancel, &rendered).await?
    } else {
        let user_context = prompt_engine::context::build_user_context_string(&user);
        let result = llm.generate_drafts(cancel, &idea.content, &user_context).await?;
        return persist_drafts(pool, user_id, idea_id, result.posts, result.articles).await;
    };

    let parsed = parsing::parse_drafts_response(&raw)?;
    persist_drafts(pool, user_id, idea_id, parsed.posts, parsed.articles).await
}

async fn persist_drafts(
    pool: &DbPool,
    user_id: &str,
    idea_id: &str,
    posts: Vec<String>,
    articles: Vec<String>,
) -> Result<Vec<Draft>, WorkflowError> {
    let post_drafts: Vec<&String> = posts.iter().filter(|p| !p.trim().is_empty()).take(5).collect();
    let article = articles
        .iter()
        .find(|a| !a.trim().is_empty())
        .ok_or_else(|| WorkflowError::InvalidInput("no non-empty article in response".to_string()))?;

    let mut built = Vec::with_capacity(post_drafts.len() + 1);
    for content in post_drafts {
        built.push(Draft::new_post_draft_from_idea(
            ObjectId::generate().to_string(),
            user_id.to_string(),
            idea_id.to_string(),
            content,
        )?);
    }
    built.push(Draft::new_article_draft_from_idea(
        ObjectId::generate().to_string(),
        user_id.to_string(),
        idea_id.to_string(),
        "",
        article,
    )?);

    for draft in &built {
        drafts::insert(pool, draft).await?;
    }

    if let Err(e) = ideas::mark_used(pool, idea_id).await {
        tracing::warn!(idea_id, error = %e, "drafts persisted but idea mark-used failed; idea remains usable");
    }

    Ok(built)
}
