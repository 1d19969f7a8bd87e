//! Idea entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default lifetime of a freshly generated idea.
pub const DEFAULT_IDEA_TTL_DAYS: i64 = 30;

/// A short, consumable content seed tied to a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub user_id: String,
    pub topic_id: String,
    pub content: String,
    pub quality_score: Option<f64>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Idea {
    /// Construct a new, unused idea expiring `DEFAULT_IDEA_TTL_DAYS` from now.
    pub fn new(id: String, user_id: String, topic_id: String, content: &str) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation("idea content must not be empty".to_string()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            topic_id,
            content: content.to_string(),
            quality_score: None,
            used: false,
            created_at: now,
            expires_at: Some(now + Duration::days(DEFAULT_IDEA_TTL_DAYS)),
        })
    }

    /// Whether the idea's expiry has already passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }

    /// Mark the idea as consumed. Rejects an idea already used (monotonic
    /// `used` flag) so a caller cannot accidentally un-use it by re-calling
    /// with stale state.
    pub fn mark_used(&mut self) -> Result<(), DomainError> {
        if self.used {
            return Err(DomainError::IdeaAlreadyUsed(self.id.clone()));
        }
        self.used = true;
        Ok(())
    }

    /// Validate that the idea can be consumed by a draft-generation run.
    pub fn check_usable(&self) -> Result<(), DomainError> {
        if self.used {
            return Err(DomainError::IdeaAlreadyUsed(self.id.clone()));
        }
        if self.is_expired() {
            return Err(DomainError::IdeaExpired(self.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_content() {
        assert!(Idea::new("i1".into(), "u1".into(), "t1".into(), "   ").is_err());
    }

    #[test]
    fn new_idea_expires_in_30_days() {
        let idea = Idea::new("i1".into(), "u1".into(), "t1".into(), "some idea").unwrap();
        let expires = idea.expires_at.unwrap();
        let delta = expires - idea.created_at;
        assert_eq!(delta.num_days(), DEFAULT_IDEA_TTL_DAYS);
        assert!(!idea.used);
    }

    #[test]
    fn mark_used_is_monotonic() {
        let mut idea = Idea::new("i1".into(), "u1".into(), "t1".into(), "some idea").unwrap();
        idea.mark_used().unwrap();
        assert!(idea.used);
        assert!(matches!(idea.mark_used(), Err(DomainError::IdeaAlreadyUsed(_))));
    }

    #[test]
    fn check_usable_rejects_expired() {
        let mut idea = Idea::new("i1".into(), "u1".into(), "t1".into(), "some idea").unwrap();
        idea.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(matches!(idea.check_usable(), Err(DomainError::IdeaExpired(_))));
    }
}
