//! User repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::User;
use crate::error::StorageError;

use super::DbPool;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    oauth_token: Option<String>,
    api_keys: String,
    configuration: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            oauth_token: self.oauth_token,
            api_keys: serde_json::from_str(&self.api_keys).unwrap_or_default(),
            configuration: serde_json::from_str(&self.configuration).unwrap_or_default(),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert a new user row.
pub async fn insert(pool: &DbPool, user: &User) -> Result<(), StorageError> {
    let api_keys = serde_json::to_string(&user.api_keys).unwrap_or_else(|_| "{}".to_string());
    let configuration = serde_json::to_string(&user.configuration).unwrap_or_else(|_| "{}".to_string());

    sqlx::query(
        "INSERT INTO users (id, email, oauth_token, api_keys, configuration, active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.oauth_token)
    .bind(api_keys)
    .bind(configuration)
    .bind(user.active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Find a user by id.
pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<User>, StorageError> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, email, oauth_token, api_keys, configuration, active, created_at, updated_at
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.map(UserRow::into_domain))
}

/// List every active user, for the scheduler tick.
pub async fn find_all_active(pool: &DbPool) -> Result<Vec<User>, StorageError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT id, email, oauth_token, api_keys, configuration, active, created_at, updated_at
         FROM users WHERE active = 1",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(rows.into_iter().map(UserRow::into_domain).collect())
}

/// Patch a user's whitelisted configuration fields, bumping `updated_at`.
pub async fn update_configuration(
    pool: &DbPool,
    id: &str,
    configuration: &HashMap<String, Value>,
) -> Result<(), StorageError> {
    let configuration = serde_json::to_string(configuration).unwrap_or_else(|_| "{}".to_string());
    let now = Utc::now();
    sqlx::query("UPDATE users SET configuration = ?, updated_at = ? WHERE id = ?")
        .bind(configuration)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let pool = init_test_db().await.unwrap();
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        insert(&pool, &user).await.unwrap();

        let found = find_by_id(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(found.email, "a@b.com");
        assert!(found.active);
    }

    #[tokio::test]
    async fn find_by_id_missing_returns_none() {
        let pool = init_test_db().await.unwrap();
        assert!(find_by_id(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_active_excludes_inactive() {
        let pool = init_test_db().await.unwrap();
        let mut user1 = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        let mut user2 = User::new("u2".to_string(), "c@d.com".to_string()).unwrap();
        user2.active = false;
        insert(&pool, &user1).await.unwrap();
        insert(&pool, &user2).await.unwrap();

        let active = find_all_active(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "u1");
        user1.active = true;
        let _ = user1;
    }
}
