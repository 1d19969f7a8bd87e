//! Draft repository, including refinement-history persistence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{Draft, DraftStatus, DraftType, RefinementEntry};
use crate::error::StorageError;

use super::DbPool;

#[derive(sqlx::FromRow)]
struct DraftRow {
    id: String,
    user_id: String,
    idea_id: Option<String>,
    draft_type: String,
    title: Option<String>,
    content: String,
    status: String,
    published_at: Option<DateTime<Utc>>,
    external_post_id: Option<String>,
    metadata: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RefinementRow {
    timestamp: DateTime<Utc>,
    prompt: String,
    content: String,
    version: i64,
}

fn type_str(t: DraftType) -> &'static str {
    match t {
        DraftType::Post => "post",
        DraftType::Article => "article",
    }
}

fn parse_type(s: &str) -> DraftType {
    match s {
        "article" => DraftType::Article,
        _ => DraftType::Post,
    }
}

fn status_str(s: DraftStatus) -> &'static str {
    match s {
        DraftStatus::Draft => "draft",
        DraftStatus::Refined => "refined",
        DraftStatus::Published => "published",
        DraftStatus::Failed => "failed",
    }
}

fn parse_status(s: &str) -> DraftStatus {
    match s {
        "refined" => DraftStatus::Refined,
        "published" => DraftStatus::Published,
        "failed" => DraftStatus::Failed,
        _ => DraftStatus::Draft,
    }
}

/// Insert a new draft row (refinement history, if any, inserted alongside).
pub async fn insert(pool: &DbPool, draft: &Draft) -> Result<(), StorageError> {
    let metadata = serde_json::to_string(&draft.metadata).unwrap_or_else(|_| "{}".to_string());

    let mut tx = pool.begin().await.map_err(|e| StorageError::Query { source: e })?;
    sqlx::query(
        "INSERT INTO drafts (id, user_id, idea_id, draft_type, title, content, status,
                              published_at, external_post_id, metadata, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.id)
    .bind(&draft.user_id)
    .bind(&draft.idea_id)
    .bind(type_str(draft.draft_type))
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(status_str(draft.status))
    .bind(draft.published_at)
    .bind(&draft.external_post_id)
    .bind(metadata)
    .bind(draft.created_at)
    .bind(draft.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    for entry in &draft.refinement_history {
        insert_refinement_entry(&mut tx, &draft.id, entry).await?;
    }

    tx.commit().await.map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

async fn insert_refinement_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    draft_id: &str,
    entry: &RefinementEntry,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO refinement_entries (draft_id, timestamp, prompt, content, version)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(draft_id)
    .bind(entry.timestamp)
    .bind(&entry.prompt)
    .bind(&entry.content)
    .bind(i64::from(entry.version))
    .execute(&mut **tx)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Persist a draft mutation: status, content, and the full refinement
/// history are replaced to match the in-memory entity.
pub async fn update(pool: &DbPool, draft: &Draft) -> Result<(), StorageError> {
    let metadata = serde_json::to_string(&draft.metadata).unwrap_or_else(|_| "{}".to_string());

    let mut tx = pool.begin().await.map_err(|e| StorageError::Query { source: e })?;
    sqlx::query(
        "UPDATE drafts SET content = ?, status = ?, title = ?, published_at = ?,
                            external_post_id = ?, metadata = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&draft.content)
    .bind(status_str(draft.status))
    .bind(&draft.title)
    .bind(draft.published_at)
    .bind(&draft.external_post_id)
    .bind(metadata)
    .bind(draft.updated_at)
    .bind(&draft.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    sqlx::query("DELETE FROM refinement_entries WHERE draft_id = ?")
        .bind(&draft.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    for entry in &draft.refinement_history {
        insert_refinement_entry(&mut tx, &draft.id, entry).await?;
    }

    tx.commit().await.map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Load a draft with its refinement history.
pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Draft>, StorageError> {
    let row: Option<DraftRow> = sqlx::query_as(
        "SELECT id, user_id, idea_id, draft_type, title, content, status, published_at,
                external_post_id, metadata, created_at, updated_at
         FROM drafts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let Some(row) = row else { return Ok(None) };

    let history: Vec<RefinementRow> = sqlx::query_as(
        "SELECT timestamp, prompt, content, version FROM refinement_entries
         WHERE draft_id = ? ORDER BY version ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let metadata: HashMap<String, String> = serde_json::from_str(&row.metadata).unwrap_or_default();

    Ok(Some(Draft {
        id: row.id,
        user_id: row.user_id,
        idea_id: row.idea_id,
        draft_type: parse_type(&row.draft_type),
        title: row.title,
        content: row.content,
        status: parse_status(&row.status),
        refinement_history: history
            .into_iter()
            .map(|h| RefinementEntry {
                timestamp: h.timestamp,
                prompt: h.prompt,
                content: h.content,
                version: h.version as u32,
            })
            .collect(),
        published_at: row.published_at,
        external_post_id: row.external_post_id,
        metadata,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
