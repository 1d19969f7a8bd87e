//! User entity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// A registered user of the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Opaque OAuth token; never logged.
    pub oauth_token: Option<String>,
    /// Named API secrets, e.g. `{"openai": "sk-..."}`.
    pub api_keys: HashMap<String, String>,
    /// Free-form per-user configuration. The prompt engine only reads a
    /// short whitelist out of this map (see `prompt_engine::context`).
    pub configuration: HashMap<String, Value>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Construct a new active user, validating the email's syntax.
    pub fn new(id: String, email: String) -> Result<Self, DomainError> {
        if !is_valid_email(&email) {
            return Err(DomainError::Validation(format!("invalid email: {email}")));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            email,
            oauth_token: None,
            api_keys: HashMap::new(),
            configuration: HashMap::new(),
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// The whitelisted context fields the prompt engine is allowed to read:
    /// `name`, `expertise`, `tone_preference`.
    pub fn context_field(&self, key: &str) -> Option<&str> {
        matches!(key, "name" | "expertise" | "tone_preference")
            .then(|| self.configuration.get(key).and_then(Value::as_str))
            .flatten()
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_email_without_at() {
        assert!(User::new("u1".to_string(), "not-an-email".to_string()).is_err());
    }

    #[test]
    fn rejects_email_without_domain_dot() {
        assert!(User::new("u1".to_string(), "a@b".to_string()).is_err());
    }

    #[test]
    fn accepts_valid_email() {
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        assert!(user.active);
    }

    #[test]
    fn context_field_is_whitelisted() {
        let mut user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        user.configuration
            .insert("name".to_string(), Value::String("Ada".to_string()));
        user.configuration
            .insert("secret".to_string(), Value::String("nope".to_string()));
        assert_eq!(user.context_field("name"), Some("Ada"));
        assert_eq!(user.context_field("secret"), None);
    }
}
