//! Dev seeder: bootstrap a canonical local-development user, topics, and
//! ideas when absent. Idempotent -- safe to run on every startup.

use crate::domain::{Idea, ObjectId, Topic, User};
use crate::error::StorageError;
use crate::storage::{ideas, topics, users, DbPool};

/// Stable id of the canonical dev user, so repeated runs find the same row.
pub const DEV_USER_ID: &str = "dev-user";
const DEV_USER_EMAIL: &str = "dev@linkgen.local";

struct DefaultTopic {
    id: &'static str,
    name: &'static str,
    ideas_count: u32,
    priority: u8,
}

const DEFAULT_TOPICS: &[DefaultTopic] = &[
    DefaultTopic { id: "dev-topic-rust", name: "Rust engineering", ideas_count: 5, priority: 5 },
    DefaultTopic { id: "dev-topic-career", name: "Career growth", ideas_count: 3, priority: 3 },
];

/// Run the dev seed: create the dev user, default topics, and one starter
/// idea per topic if they don't already exist. Each step checks for
/// existing state first, so running this repeatedly is a no-op past the
/// first successful run.
pub async fn run_dev_seed(pool: &DbPool) -> Result<(), StorageError> {
    if users::find_by_id(pool, DEV_USER_ID).await?.is_none() {
        let user = User::new(DEV_USER_ID.to_string(), DEV_USER_EMAIL.to_string())
            .expect("built-in dev email is always valid");
        users::insert(pool, &user).await?;
        tracing::info!(user_id = DEV_USER_ID, "seeded dev user");
    }

    let existing = topics::find_active_by_user_id(pool, DEV_USER_ID).await?;
    for default in DEFAULT_TOPICS {
        if existing.iter().any(|t| t.id == default.id) {
            continue;
        }
        let topic = Topic::new(
            default.id.to_string(),
            DEV_USER_ID.to_string(),
            default.name,
            default.ideas_count,
            default.priority,
        )
        .expect("built-in default topic parameters are always valid");
        topics::insert(pool, &topic).await?;
        tracing::info!(topic_id = default.id, "seeded dev topic");

        // Ideas are looked up by `ObjectId` (24 lowercase-hex) downstream in
        // generate_drafts, so the seed can't use a readable slug here.
        let idea = Idea::new(
            ObjectId::generate().to_string(),
            DEV_USER_ID.to_string(),
            default.id.to_string(),
            &format!("Write about what's new in {}.", default.name),
        )
        .expect("built-in seed idea content is always valid");
        ideas::insert_batch(pool, &[idea]).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn seeds_dev_user_and_topics_once() {
        let pool = init_test_db().await.unwrap();
        run_dev_seed(&pool).await.unwrap();

        let user = users::find_by_id(&pool, DEV_USER_ID).await.unwrap();
        assert!(user.is_some());

        let topics = topics::find_active_by_user_id(&pool, DEV_USER_ID).await.unwrap();
        assert_eq!(topics.len(), DEFAULT_TOPICS.len());
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let pool = init_test_db().await.unwrap();
        run_dev_seed(&pool).await.unwrap();
        run_dev_seed(&pool).await.unwrap();

        let topics = topics::find_active_by_user_id(&pool, DEV_USER_ID).await.unwrap();
        assert_eq!(topics.len(), DEFAULT_TOPICS.len());

        let ideas = ideas::find_by_topic_id(&pool, "dev-topic-rust").await.unwrap();
        assert_eq!(ideas.len(), 1);
    }
}
