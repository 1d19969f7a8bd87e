//! Dead-letter record repository: one row per non-retryable job failure.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::ObjectId;
use crate::error::StorageError;

use super::DbPool;

/// A persisted record of a draft-generation job that will not be retried.
#[derive(Debug, Clone)]
pub struct JobError {
    pub id: String,
    pub job_id: String,
    pub user_id: String,
    pub idea_id: Option<String>,
    pub stage: String,
    pub error_message: String,
    pub raw_response: Option<String>,
    pub prompt: Option<String>,
    pub attempt: u32,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl JobError {
    /// Construct a job-error record ready for persistence.
    pub fn new(
        job_id: String,
        user_id: String,
        idea_id: Option<String>,
        stage: &str,
        error_message: String,
        raw_response: Option<String>,
        prompt: Option<String>,
        attempt: u32,
    ) -> Self {
        Self {
            id: ObjectId::generate().to_string(),
            job_id,
            user_id,
            idea_id,
            stage: stage.to_string(),
            error_message,
            raw_response,
            prompt,
            attempt,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Insert a job-error (dead-letter) row.
pub async fn insert(pool: &DbPool, job_error: &JobError) -> Result<(), StorageError> {
    let metadata = serde_json::to_string(&job_error.metadata).unwrap_or_else(|_| "{}".to_string());
    sqlx::query(
        "INSERT INTO job_errors (id, job_id, user_id, idea_id, stage, error_message, raw_response,
                                  prompt, attempt, metadata, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&job_error.id)
    .bind(&job_error.job_id)
    .bind(&job_error.user_id)
    .bind(&job_error.idea_id)
    .bind(&job_error.stage)
    .bind(&job_error.error_message)
    .bind(&job_error.raw_response)
    .bind(&job_error.prompt)
    .bind(i64::from(job_error.attempt))
    .bind(metadata)
    .bind(job_error.created_at)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Count job-error rows for a given job id, mainly for test assertions.
pub async fn count_for_job(pool: &DbPool, job_id: &str) -> Result<i64, StorageError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_errors WHERE job_id = ?")
        .bind(job_id)
        .fetch_one(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.0)
}
