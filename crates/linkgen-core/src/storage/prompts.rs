//! Prompt template repository.
//!
//! `FindOrCreateByName` and `Upsert` use check-then-insert/update: SQLite's
//! single-writer semantics make this last-writer-wins safe enough per the
//! repository contract, which explicitly allows it when no transactional
//! backend is available.

use chrono::{DateTime, Utc};

use crate::domain::{Prompt, PromptType};
use crate::error::{DomainError, StorageError};

use super::{topics, DbPool};

#[derive(sqlx::FromRow)]
struct PromptRow {
    id: String,
    user_id: String,
    name: String,
    prompt_type: String,
    style_name: Option<String>,
    template: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromptRow {
    fn into_domain(self) -> Prompt {
        Prompt {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            prompt_type: parse_type(&self.prompt_type),
            style_name: self.style_name,
            template: self.template,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn type_str(t: PromptType) -> &'static str {
    match t {
        PromptType::Ideas => "ideas",
        PromptType::Drafts => "drafts",
    }
}

fn parse_type(s: &str) -> PromptType {
    match s {
        "drafts" => PromptType::Drafts,
        _ => PromptType::Ideas,
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, name, prompt_type, style_name, template, active, created_at, updated_at";

/// Find a prompt by (user, name), regardless of type or active flag.
pub async fn find_by_name(pool: &DbPool, user_id: &str, name: &str) -> Result<Option<Prompt>, StorageError> {
    let row: Option<PromptRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM prompts WHERE user_id = ? AND name = ?"
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.map(PromptRow::into_domain))
}

/// List active prompts for (user, type), most recently updated first.
pub async fn find_active_by_user_id_and_type(
    pool: &DbPool,
    user_id: &str,
    prompt_type: PromptType,
) -> Result<Vec<Prompt>, StorageError> {
    let rows: Vec<PromptRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM prompts
         WHERE user_id = ? AND prompt_type = ? AND active = 1
         ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .bind(type_str(prompt_type))
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(rows.into_iter().map(PromptRow::into_domain).collect())
}

/// Find an existing prompt by name, or create and persist a new one.
pub async fn find_or_create_by_name(
    pool: &DbPool,
    id: impl FnOnce() -> String,
    user_id: &str,
    name: &str,
    prompt_type: PromptType,
    template: &str,
) -> Result<Prompt, StorageError> {
    if let Some(existing) = find_by_name(pool, user_id, name).await? {
        return Ok(existing);
    }
    let prompt = Prompt::new(id(), user_id.to_string(), name, prompt_type, None, template)
        .map_err(|e| StorageError::Query { source: sqlx::Error::Protocol(e.to_string()) })?;
    insert(pool, &prompt).await?;
    Ok(prompt)
}

/// Insert a brand-new prompt row.
pub async fn insert(pool: &DbPool, prompt: &Prompt) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO prompts (id, user_id, name, prompt_type, style_name, template, active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&prompt.id)
    .bind(&prompt.user_id)
    .bind(&prompt.name)
    .bind(type_str(prompt.prompt_type))
    .bind(&prompt.style_name)
    .bind(&prompt.template)
    .bind(prompt.active)
    .bind(prompt.created_at)
    .bind(prompt.updated_at)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Replace the template (and activate) an existing prompt by name, or
/// insert it if absent. `created_at` is preserved across repeated upserts.
pub async fn upsert(
    pool: &DbPool,
    id: impl FnOnce() -> String,
    user_id: &str,
    name: &str,
    prompt_type: PromptType,
    style_name: Option<String>,
    template: &str,
) -> Result<Prompt, StorageError> {
    if let Some(mut existing) = find_by_name(pool, user_id, name).await? {
        existing
            .replace_template(template)
            .map_err(|e| StorageError::Query { source: sqlx::Error::Protocol(e.to_string()) })?;
        existing.active = true;
        sqlx::query("UPDATE prompts SET template = ?, active = 1, updated_at = ? WHERE id = ?")
            .bind(&existing.template)
            .bind(existing.updated_at)
            .bind(&existing.id)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
        return Ok(existing);
    }

    let prompt = Prompt::new(id(), user_id.to_string(), name, prompt_type, style_name, template)
        .map_err(|e| StorageError::Query { source: sqlx::Error::Protocol(e.to_string()) })?;
    insert(pool, &prompt).await?;
    Ok(prompt)
}

/// Deactivate a user's prompt by name without deleting it.
pub async fn deactivate_by_user_id_and_name(
    pool: &DbPool,
    user_id: &str,
    name: &str,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE prompts SET active = 0, updated_at = ? WHERE user_id = ? AND name = ?")
        .bind(Utc::now())
        .bind(user_id)
        .bind(name)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Delete a prompt by id, rejecting with `PromptInUse` if any topic still
/// references it by name.
pub async fn delete(pool: &DbPool, id: &str) -> Result<(), DomainError> {
    let row: Option<PromptRow> = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM prompts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    let Some(row) = row else {
        return Err(DomainError::PromptNotFound(id.to_string()));
    };

    if topics::any_references_prompt(pool, &row.user_id, &row.name)
        .await
        .map_err(|e| DomainError::Validation(e.to_string()))?
    {
        return Err(DomainError::PromptInUse(row.name));
    }

    sqlx::query("DELETE FROM prompts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    Ok(())
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
    async fn upsert_is_idempotent_and_preserves_created_at() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;

        let p1 = upsert(&pool, || "p1".to_string(), "u1", "default", PromptType::Ideas, None, "t1 {ideas} {name}")
            .await
            .unwrap();
        let p2 = upsert(&pool, || "p2".to_string(), "u1", "default", PromptType::Ideas, None, "t2 {ideas} {name}")
            .await
            .unwrap();

        assert_eq!(p1.id, p2.id);
        assert_eq!(p2.template, "t2 {ideas} {name}");
        assert_eq!(p1.created_at, p2.created_at);
        assert!(p2.updated_at >= p1.updated_at);
    }

    #[tokio::test]
    async fn find_or_create_returns_existing() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        let p1 = find_or_create_by_name(&pool, || "p1".to_string(), "u1", "default", PromptType::Ideas, "t {ideas} {name}")
            .await
            .unwrap();
        let p2 = find_or_create_by_name(&pool, || "p2".to_string(), "u1", "default", PromptType::Ideas, "other {ideas} {name}")
            .await
            .unwrap();
        assert_eq!(p1.id, p2.id);
        assert_eq!(p2.template, "t {ideas} {name}");
    }

    #[tokio::test]
    async fn delete_rejects_when_referenced_by_topic() {
        use crate::domain::Topic;
        use crate::storage::topics;

        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        let prompt = upsert(&pool, || "p1".to_string(), "u1", "profesional", PromptType::Ideas, None, "t {ideas} {name}")
            .await
            .unwrap();

        let mut topic = Topic::new("t1".to_string(), "u1".to_string(), "Rust", 5, 5).unwrap();
        topic.prompt = Some("profesional".to_string());
        topics::insert(&pool, &topic).await.unwrap();

        let result = delete(&pool, &prompt.id).await;
        assert!(matches!(result, Err(DomainError::PromptInUse(_))));
    }

    #[tokio::test]
    async fn delete_succeeds_when_unreferenced() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        let prompt = upsert(&pool, || "p1".to_string(), "u1", "default", PromptType::Ideas, None, "t {ideas} {name}")
            .await
            .unwrap();
        delete(&pool, &prompt.id).await.unwrap();
        assert!(find_by_name(&pool, "u1", "default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deactivate_does_not_delete_row() {
        let pool = init_test_db().await.unwrap();
        seed_user(&pool).await;
        upsert(&pool, || "p1".to_string(), "u1", "default", PromptType::Ideas, None, "t {ideas} {name}")
            .await
            .unwrap();
        deactivate_by_user_id_and_name(&pool, "u1", "default").await.unwrap();
        let found = find_by_name(&pool, "u1", "default").await.unwrap().unwrap();
        assert!(!found.active);
    }
}
