//! Prompt template entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The well-known fallback drafts style used when a user has no active
/// drafts template of their own.
pub const DEFAULT_DRAFTS_STYLE: &str = "profesional";

/// Which use-case a prompt template targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Ideas,
    Drafts,
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PromptType::Ideas => "ideas",
            PromptType::Drafts => "drafts",
        };
        write!(f, "{s}")
    }
}

/// A named, typed, user-scoped prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub prompt_type: PromptType,
    /// Required iff `prompt_type == Drafts`.
    pub style_name: Option<String>,
    pub template: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Construct a new active prompt, requiring a non-empty template and a
    /// `style_name` when the type is `drafts`.
    pub fn new(
        id: String,
        user_id: String,
        name: &str,
        prompt_type: PromptType,
        style_name: Option<String>,
        template: &str,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("prompt name must not be empty".to_string()));
        }
        let template = template.trim();
        if template.is_empty() {
            return Err(DomainError::Validation("prompt template must not be empty".to_string()));
        }
        if prompt_type == PromptType::Drafts && style_name.as_deref().unwrap_or("").trim().is_empty() {
            return Err(DomainError::Validation(
                "drafts prompts require a style_name".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            name: name.to_string(),
            prompt_type,
            style_name,
            template: template.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the template content, preserving `created_at` and bumping
    /// `updated_at` — the effect of `Upsert` on an existing row.
    pub fn replace_template(&mut self, template: &str) -> Result<(), DomainError> {
        let template = template.trim();
        if template.is_empty() {
            return Err(DomainError::Validation("prompt template must not be empty".to_string()));
        }
        self.template = template.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Deactivate the prompt without deleting it.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_template() {
        let result = Prompt::new("p1".into(), "u1".into(), "default", PromptType::Ideas, None, "   ");
        assert!(result.is_err());
    }

    #[test]
    fn drafts_prompt_requires_style_name() {
        let result = Prompt::new(
            "p1".into(),
            "u1".into(),
            "default",
            PromptType::Drafts,
            None,
            "template {idea}",
        );
        assert!(result.is_err());
    }

    #[test]
    fn ideas_prompt_does_not_require_style_name() {
        let result = Prompt::new(
            "p1".into(),
            "u1".into(),
            "default",
            PromptType::Ideas,
            None,
            "template {ideas} {name}",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn replace_template_bumps_updated_at() {
        let mut prompt = Prompt::new(
            "p1".into(),
            "u1".into(),
            "default",
            PromptType::Ideas,
            None,
            "template {ideas} {name}",
        )
        .unwrap();
        let created = prompt.created_at;
        prompt.replace_template("new template {ideas} {name}").unwrap();
        assert_eq!(prompt.template, "new template {ideas} {name}");
        assert_eq!(prompt.created_at, created);
    }

    #[test]
    fn deactivate_does_not_delete() {
        let mut prompt = Prompt::new(
            "p1".into(),
            "u1".into(),
            "default",
            PromptType::Ideas,
            None,
            "template {ideas} {name}",
        )
        .unwrap();
        prompt.deactivate();
        assert!(!prompt.active);
        assert_eq!(prompt.name, "default");
    }
}
