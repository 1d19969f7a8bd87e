//! Topic entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const NAME_MAX: usize = 100;
const MAX_RELATED_TOPICS: usize = 10;
const MIN_IDEAS: u32 = 1;
const MAX_IDEAS: u32 = 20;
const MIN_PRIORITY: u8 = 1;
const MAX_PRIORITY: u8 = 10;

/// A user's content area: a named subject the scheduler periodically
/// generates ideas for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub priority: u8,
    pub ideas_count: u32,
    /// Name of a `PromptType::Ideas` template this topic prefers, if any.
    pub prompt: Option<String>,
    pub related_topics: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// Construct a new active topic, validating name length, priority range,
    /// ideas-count range, and normalising related-topics (lowercase,
    /// trimmed, capped at 10, deduplicated).
    pub fn new(
        id: String,
        user_id: String,
        name: &str,
        ideas_count: u32,
        priority: u8,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > NAME_MAX {
            return Err(DomainError::Validation(format!(
                "topic name must be non-empty and at most {NAME_MAX} chars"
            )));
        }
        if !(MIN_IDEAS..=MAX_IDEAS).contains(&ideas_count) {
            return Err(DomainError::Validation(format!(
                "ideas count {ideas_count} outside [{MIN_IDEAS},{MAX_IDEAS}]"
            )));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(DomainError::Validation(format!(
                "priority {priority} outside [{MIN_PRIORITY},{MAX_PRIORITY}]"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            name: name.to_string(),
            description: String::new(),
            category: String::new(),
            keywords: Vec::new(),
            priority,
            ideas_count,
            prompt: None,
            related_topics: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Normalise and set related topics: lowercase, trimmed, deduplicated,
    /// capped at `MAX_RELATED_TOPICS`.
    pub fn set_related_topics(&mut self, related: impl IntoIterator<Item = String>) {
        let mut normalized = Vec::new();
        for r in related {
            let r = r.trim().to_lowercase();
            if !r.is_empty() && !normalized.contains(&r) {
                normalized.push(r);
            }
            if normalized.len() == MAX_RELATED_TOPICS {
                break;
            }
        }
        self.related_topics = normalized;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(Topic::new("t1".into(), "u1".into(), "  ", 5, 5).is_err());
    }

    #[test]
    fn rejects_name_over_100_chars() {
        let name = "x".repeat(101);
        assert!(Topic::new("t1".into(), "u1".into(), &name, 5, 5).is_err());
    }

    #[test]
    fn rejects_ideas_count_out_of_range() {
        assert!(Topic::new("t1".into(), "u1".into(), "Rust", 0, 5).is_err());
        assert!(Topic::new("t1".into(), "u1".into(), "Rust", 21, 5).is_err());
    }

    #[test]
    fn rejects_priority_out_of_range() {
        assert!(Topic::new("t1".into(), "u1".into(), "Rust", 5, 0).is_err());
        assert!(Topic::new("t1".into(), "u1".into(), "Rust", 5, 11).is_err());
    }

    #[test]
    fn related_topics_normalized_and_capped() {
        let mut topic = Topic::new("t1".into(), "u1".into(), "Rust", 5, 5).unwrap();
        let related = vec![
            "  Async ".to_string(),
            "ASYNC".to_string(),
            "tokio".to_string(),
        ];
        topic.set_related_topics(related);
        assert_eq!(topic.related_topics, vec!["async".to_string(), "tokio".to_string()]);
    }

    #[test]
    fn related_topics_capped_at_ten() {
        let mut topic = Topic::new("t1".into(), "u1".into(), "Rust", 5, 5).unwrap();
        let related: Vec<String> = (0..15).map(|i| format!("topic{i}")).collect();
        topic.set_related_topics(related);
        assert_eq!(topic.related_topics.len(), MAX_RELATED_TOPICS);
    }
}
