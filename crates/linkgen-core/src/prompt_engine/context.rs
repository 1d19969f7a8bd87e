//! Substitution-map construction from domain entities.

use std::collections::HashMap;

use crate::domain::{Idea, Topic, User};

/// The scalar and array substitution maps fed to [`super::template::substitute`].
#[derive(Debug, Default)]
pub struct SubstitutionContext {
    pub scalars: HashMap<String, String>,
    pub arrays: HashMap<String, Vec<String>>,
}

impl SubstitutionContext {
    pub fn from_topic(mut self, topic: &Topic) -> Self {
        self.scalars.insert("topic_name".to_string(), topic.name.clone());
        self.scalars.insert("topic_description".to_string(), topic.description.clone());
        self.scalars.insert("ideas".to_string(), topic.ideas_count.to_string());
        self.arrays.insert("related_topics".to_string(), topic.related_topics.clone());
        self.arrays.insert("keywords".to_string(), topic.keywords.clone());
        self
    }

    pub fn from_idea(mut self, idea: &Idea) -> Self {
        self.scalars.insert("idea".to_string(), idea.content.clone());
        self
    }

    /// Expose only the whitelisted user context fields: `name`, `expertise`,
    /// `tone_preference`.
    pub fn from_user(mut self, user: &User) -> Self {
        for key in ["name", "expertise", "tone_preference"] {
            if let Some(value) = user.context_field(key) {
                self.scalars.insert(key.to_string(), value.to_string());
            }
        }
        self.scalars.entry("name".to_string()).or_insert_with(|| user.email.clone());
        self
    }

    pub fn with_user_context(mut self, user_context: String) -> Self {
        self.scalars.insert("user_context".to_string(), user_context);
        self
    }
}

/// Build the small multi-line user-context string passed to `GenerateDrafts`
/// when no prompt engine is available: each of `name`, `expertise`,
/// `tone_preference` appended only if non-empty, falling back to a fixed
/// default when the user has configured none of them.
pub fn build_user_context_string(user: &User) -> String {
    let mut lines = Vec::new();
    if let Some(name) = user.context_field("name") {
        lines.push(format!("Name: {name}"));
    }
    if let Some(expertise) = user.context_field("expertise") {
        lines.push(format!("Expertise: {expertise}"));
    }
    if let Some(tone) = user.context_field("tone_preference") {
        lines.push(format!("Preferred tone: {tone}"));
    }
    if lines.is_empty() {
        "General professional content".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn build_user_context_falls_back_when_empty() {
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        assert_eq!(build_user_context_string(&user), "General professional content");
    }

    #[test]
    fn build_user_context_includes_configured_fields() {
        let mut user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        user.configuration.insert("name".to_string(), Value::String("Ada".to_string()));
        user.configuration.insert("expertise".to_string(), Value::String("Rust".to_string()));
        let context = build_user_context_string(&user);
        assert!(context.contains("Name: Ada"));
        assert!(context.contains("Expertise: Rust"));
        assert!(!context.contains("Preferred tone"));
    }
}
