//! Idea repository.

use chrono::{DateTime, Utc};

use crate::domain::Idea;
use crate::error::{DomainError, StorageError};

use super::DbPool;

#[derive(sqlx::FromRow)]
struct IdeaRow {
    id: String,
    user_id: String,
    topic_id: String,
    content: String,
    quality_score: Option<f64>,
    used: bool,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl IdeaRow {
    fn into_domain(self) -> Idea {
        Idea {
            id: self.id,
            user_id: self.user_id,
            topic_id: self.topic_id,
            content: self.content,
            quality_score: self.quality_score,
            used: self.used,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Insert a batch of ideas in a single transaction.
pub async fn insert_batch(pool: &DbPool, ideas: &[Idea]) -> Result<(), StorageError> {
    let mut tx = pool.begin().await.map_err(|e| StorageError::Query { source: e })?;
    for idea in ideas {
        sqlx::query(
            "INSERT INTO ideas (id, user_id, topic_id, content, quality_score, used, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&idea.id)
        .bind(&idea.user_id)
        .bind(&idea.topic_id)
        .bind(&idea.content)
        .bind(idea.quality_score)
        .bind(idea.used)
        .bind(idea.created_at)
        .bind(idea.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    }
    tx.commit().await.map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Find an idea by id.
pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Idea>, StorageError> {
    let row: Option<IdeaRow> = sqlx::query_as(
        "SELECT id, user_id, topic_id, content, quality_score, used, created_at, expires_at
         FROM ideas WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.map(IdeaRow::into_domain))
}

/// List every idea generated for a topic, most recent first.
pub async fn find_by_topic_id(pool: &DbPool, topic_id: &str) -> Result<Vec<Idea>, StorageError> {
    let rows: Vec<IdeaRow> = sqlx::query_as(
        "SELECT id, user_id, topic_id, content, quality_score, used, created_at, expires_at
         FROM ideas WHERE topic_id = ? ORDER BY created_at DESC",
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(rows.into_iter().map(IdeaRow::into_domain).collect())
}

/// Mark an idea used, returning `DomainError::IdeaAlreadyUsed` if it was
/// already used by the time of the update (race-safe compare-and-set).
pub async fn mark_used(pool: &DbPool, id: &str) -> Result<(), DomainError> {
    let result = sqlx::query("UPDATE ideas SET used = 1 WHERE id = ? AND used = 0")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    if result.rows_affected() == 0 {
        return Err(DomainError::IdeaAlreadyUsed(id.to_string()));
    }
    Ok(())
}
