//! Wire shape for queue messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable work item published to the `draft.generate` subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftGenerationMessage {
    pub job_id: Uuid,
    pub user_id: String,
    pub idea_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
}

impl DraftGenerationMessage {
    /// Construct a fresh message with `retry_count = 0` and a new job id.
    pub fn new(user_id: String, idea_id: Option<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user_id,
            idea_id,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    /// Build the republish message for a retry: same job id, incremented
    /// `retry_count`, refreshed timestamp.
    pub fn next_attempt(&self) -> Self {
        Self {
            job_id: self.job_id,
            user_id: self.user_id.clone(),
            idea_id: self.idea_id.clone(),
            timestamp: Utc::now(),
            retry_count: self.retry_count + 1,
        }
    }
}
