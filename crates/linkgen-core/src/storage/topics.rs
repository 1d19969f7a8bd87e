//! Topic repository.

use chrono::{DateTime, Utc};

use crate::domain::Topic;
use crate::error::StorageError;

use super::DbPool;

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: String,
    user_id: String,
    name: String,
    description: String,
    category: String,
    keywords: String,
    priority: i64,
    ideas_count: i64,
    prompt: Option<String>,
    related_topics: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TopicRow {
    fn into_domain(self) -> Topic {
        Topic {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            category: self.category,
            keywords: serde_json::from_str(&self.keywords).unwrap_or_default(),
            priority: self.priority as u8,
            ideas_count: self.ideas_count as u32,
            prompt: self.prompt,
            related_topics: serde_json::from_str(&self.related_topics).unwrap_or_default(),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert a new topic row.
pub async fn insert(pool: &DbPool, topic: &Topic) -> Result<(), StorageError> {
    let keywords = serde_json::to_string(&topic.keywords).unwrap_or_else(|_| "[]".to_string());
    let related_topics =
        serde_json::to_string(&topic.related_topics).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        "INSERT INTO topics (id, user_id, name, description, category, keywords, priority,
                              ideas_count, prompt, related_topics, active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&topic.id)
    .bind(&topic.user_id)
    .bind(&topic.name)
    .bind(&topic.description)
    .bind(&topic.category)
    .bind(keywords)
    .bind(i64::from(topic.priority))
    .bind(i64::from(topic.ideas_count))
    .bind(&topic.prompt)
    .bind(related_topics)
    .bind(topic.active)
    .bind(topic.created_at)
    .bind(topic.updated_at)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Find a topic by id.
pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Topic>, StorageError> {
    let row: Option<TopicRow> = sqlx::query_as(
        "SELECT id, user_id, name, description, category, keywords, priority, ideas_count,
                prompt, related_topics, active, created_at, updated_at
         FROM topics WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.map(TopicRow::into_domain))
}

/// List a user's active topics.
pub async fn find_active_by_user_id(pool: &DbPool, user_id: &str) -> Result<Vec<Topic>, StorageError> {
    let rows: Vec<TopicRow> = sqlx::query_as(
        "SELECT id, user_id, name, description, category, keywords, priority, ideas_count,
                prompt, related_topics, active, created_at, updated_at
         FROM topics WHERE user_id = ? AND active = 1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(rows.into_iter().map(TopicRow::into_domain).collect())
}

/// Pick one active topic for a user uniformly at random.
pub async fn find_random_active_by_user_id(
    pool: &DbPool,
    user_id: &str,
) -> Result<Option<Topic>, StorageError> {
    let row: Option<TopicRow> = sqlx::query_as(
        "SELECT id, user_id, name, description, category, keywords, priority, ideas_count,
                prompt, related_topics, active, created_at, updated_at
         FROM topics WHERE user_id = ? AND active = 1 ORDER BY RANDOM() LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.map(TopicRow::into_domain))
}

/// Whether any topic still references `prompt_name` for `user_id`, used to
/// enforce `PromptInUse` on prompt deletion.
pub async fn any_references_prompt(
    pool: &DbPool,
    user_id: &str,
    prompt_name: &str,
) -> Result<bool, StorageError> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM topics WHERE user_id = ? AND prompt = ?")
            .bind(user_id)
            .bind(prompt_name)
            .fetch_one(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
    Ok(count.0 > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::storage::{init_test_db, users};

    async fn seed_user(pool: &DbPool) {
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(pool, &user).await.unwrap();
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        let topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust", 5, 5).unwrap();
        insert(&pool, &topic).await.unwrap();

        let found = find_by_id(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(found.name, "Rust");
        assert_eq!(found.ideas_count, 5);
    }

    #[tokio::test]
    async fn find_random_active_returns_none_when_empty() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        assert!(find_random_active_by_user_id(&pool, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn any_references_prompt_detects_usage() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        let mut topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust", 5, 5).unwrap();
        topic.prompt = Some("profesional".to_string());
        insert(&pool, &topic).await.unwrap();

        assert!(any_references_prompt(&pool, "u1", "profesional").await.unwrap());
        assert!(!any_references_prompt(&pool, "u1", "other").await.unwrap());
    }
}
