//! Prompt engine: template expansion over user-selected, named, typed
//! templates, backed by the prompt store in `storage::prompts`.

pub mod context;
pub mod seed;
pub mod template;

use crate::domain::{Idea, PromptType, Topic, User};
use crate::error::WorkflowError;
use crate::storage::{prompts, DbPool};

use context::SubstitutionContext;

/// Built-in fallback template used when a user has no persisted template
/// and no seed directory has been synced.
pub const DEFAULT_IDEAS_TEMPLATE: &str =
    "Generate {ideas} content ideas for {name} about the following topic: {topic_name}. \
     {topic_description}\nKeywords:\n{[keywords]}";

/// Built-in fallback template used for drafts when no seed has been synced.
pub const DEFAULT_DRAFTS_TEMPLATE: &str =
    "Idea: {idea}\n\nAuthor context: {user_context}\n\n\
     Write 5 short social posts and 1 long-form article derived from this idea.";

/// Resolve the active template for `(user, type, name)`, build the
/// substitution context from the given topic/idea/user, and return the
/// expanded prompt string.
pub async fn process_prompt(
    pool: &DbPool,
    user_id: &str,
    name: &str,
    prompt_type: PromptType,
    topic: Option<&Topic>,
    idea: Option<&Idea>,
    user: &User,
) -> Result<String, WorkflowError> {
    let template = resolve_template(pool, user_id, name, prompt_type).await?;

    let mut ctx = SubstitutionContext::default();
    if let Some(topic) = topic {
        ctx = ctx.from_topic(topic);
    }
    if let Some(idea) = idea {
        ctx = ctx.from_idea(idea);
    }
    ctx = ctx.from_user(user);
    if prompt_type == PromptType::Drafts {
        ctx = ctx.with_user_context(context::build_user_context_string(user));
    }

    let strict = prompt_type == PromptType::Ideas;
    let rendered = template::substitute(&template, &ctx.scalars, &ctx.arrays, strict)?;
    Ok(rendered)
}

async fn resolve_template(
    pool: &DbPool,
    user_id: &str,
    name: &str,
    prompt_type: PromptType,
) -> Result<String, WorkflowError> {
    let active = prompts::find_active_by_user_id_and_type(pool, user_id, prompt_type).await?;
    if let Some(found) = active.into_iter().find(|p| p.name == name) {
        return Ok(found.template);
    }

    if let Some(found) = prompts::find_by_name(pool, user_id, name).await? {
        return Ok(found.template);
    }

    match prompt_type {
        PromptType::Ideas => Ok(DEFAULT_IDEAS_TEMPLATE.to_string()),
        PromptType::Drafts => Ok(DEFAULT_DRAFTS_TEMPLATE.to_string()),
    }
}
