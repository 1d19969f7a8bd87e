//! Draft entity and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DomainError;

/// Content-length bounds, by draft type.
const POST_MIN: usize = 10;
const POST_MAX: usize = 3_000;
const ARTICLE_MIN: usize = 100;
const ARTICLE_MAX: usize = 110_000;
const ARTICLE_TITLE_MIN: usize = 10;
const ARTICLE_TITLE_MAX: usize = 120;

const DEFAULT_ARTICLE_TITLE: &str = "LinkedIn Article";

/// Draft lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Refined,
    Published,
    Failed,
}

impl DraftStatus {
    /// Whether a transition to `refined` is currently legal.
    pub fn can_refine(self) -> bool {
        matches!(self, DraftStatus::Draft | DraftStatus::Refined)
    }

    /// Whether `to` is a legal transition target from `self`, per the
    /// draft/refined/published/failed table.
    pub fn can_transition_to(self, to: DraftStatus) -> bool {
        use DraftStatus::*;
        matches!(
            (self, to),
            (Draft, Refined)
                | (Draft, Published)
                | (Draft, Failed)
                | (Refined, Draft)
                | (Refined, Published)
                | (Refined, Failed)
                | (Failed, Draft)
        )
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Refined => "refined",
            DraftStatus::Published => "published",
            DraftStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Draft content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftType {
    Post,
    Article,
}

impl DraftType {
    fn content_bounds(self) -> (usize, usize) {
        match self {
            DraftType::Post => (POST_MIN, POST_MAX),
            DraftType::Article => (ARTICLE_MIN, ARTICLE_MAX),
        }
    }
}

/// An immutable, appended-only entry in a draft's refinement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementEntry {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub content: String,
    pub version: u32,
}

/// A piece of generated or refined content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub user_id: String,
    pub idea_id: Option<String>,
    pub draft_type: DraftType,
    pub title: Option<String>,
    pub content: String,
    pub status: DraftStatus,
    pub refinement_history: Vec<RefinementEntry>,
    pub published_at: Option<DateTime<Utc>>,
    pub external_post_id: Option<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Build a post draft from idea content, trimming and validating length.
    pub fn new_post_draft_from_idea(
        id: String,
        user_id: String,
        idea_id: String,
        content: &str,
    ) -> Result<Self, DomainError> {
        let content = pad_to_min(content.trim(), POST_MIN);
        validate_length(&content, DraftType::Post)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            idea_id: Some(idea_id),
            draft_type: DraftType::Post,
            title: None,
            content,
            status: DraftStatus::Draft,
            refinement_history: Vec::new(),
            published_at: None,
            external_post_id: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Build an article draft from a raw title and content, normalising the
    /// title and padding content to the minimum length if necessary.
    pub fn new_article_draft_from_idea(
        id: String,
        user_id: String,
        idea_id: String,
        title: &str,
        content: &str,
    ) -> Result<Self, DomainError> {
        let title = normalize_article_title(title, content);
        let content = pad_to_min(content.trim(), ARTICLE_MIN);
        validate_length(&content, DraftType::Article)?;
        if title.chars().count() < ARTICLE_TITLE_MIN || title.chars().count() > ARTICLE_TITLE_MAX {
            return Err(DomainError::Validation(format!(
                "article title length {} outside [{},{}]",
                title.chars().count(),
                ARTICLE_TITLE_MIN,
                ARTICLE_TITLE_MAX
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            idea_id: Some(idea_id),
            draft_type: DraftType::Article,
            title: Some(title),
            content,
            status: DraftStatus::Draft,
            refinement_history: Vec::new(),
            published_at: None,
            external_post_id: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Append a refinement entry, bumping the version and transitioning
    /// `draft -> refined` when currently `draft`.
    pub fn append_refinement(&mut self, prompt: String, content: String) -> Result<(), DomainError> {
        if !self.status.can_refine() {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: DraftStatus::Refined.to_string(),
            });
        }
        validate_length(&content, self.draft_type)?;

        let next_version = self
            .refinement_history
            .iter()
            .map(|e| e.version)
            .max()
            .map_or(1, |v| v + 1);

        self.refinement_history.push(RefinementEntry {
            timestamp: Utc::now(),
            prompt,
            content: content.clone(),
            version: next_version,
        });
        self.content = content;

        if self.status == DraftStatus::Draft {
            self.status = DraftStatus::Refined;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition to an arbitrary target status, enforcing the table.
    pub fn transition_to(&mut self, to: DraftStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_length(content: &str, draft_type: DraftType) -> Result<(), DomainError> {
    let (min, max) = draft_type.content_bounds();
    let len = content.chars().count();
    if len < min || len > max {
        return Err(DomainError::Validation(format!(
            "{draft_type:?} content length {len} outside [{min},{max}]"
        )));
    }
    Ok(())
}

fn pad_to_min(content: &str, min: usize) -> String {
    if content.chars().count() >= min {
        return content.to_string();
    }
    let mut padded = content.to_string();
    if !padded.is_empty() {
        padded.push('\n');
    }
    padded.push_str(
        "Note: this content has been extended to satisfy the minimum length \
         requirement for publication.",
    );
    padded
}

/// Extract an article title from raw LLM content, per the precedence rules:
/// a heading line of acceptable length, else the first non-empty line, else
/// a truncated prefix of the content, else a fixed fallback.
fn normalize_article_title(raw_title: &str, content: &str) -> String {
    let trimmed = raw_title.trim();
    if !trimmed.is_empty() {
        return truncate_chars(trimmed, ARTICLE_TITLE_MAX);
    }

    for line in content.lines() {
        let line = line.trim();
        if let Some(heading) = line.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            let len = heading.chars().count();
            if len >= ARTICLE_TITLE_MIN && len <= ARTICLE_TITLE_MAX {
                return heading.to_string();
            }
        }
    }

    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() {
            let len = line.chars().count();
            if len >= ARTICLE_TITLE_MIN {
                return truncate_chars(line, ARTICLE_TITLE_MAX);
            }
        }
    }

    let flattened = content.trim();
    if flattened.chars().count() >= ARTICLE_TITLE_MIN {
        return truncate_chars(flattened, ARTICLE_TITLE_MAX);
    }

    DEFAULT_ARTICLE_TITLE.to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
