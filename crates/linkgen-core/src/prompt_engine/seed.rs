//! Seed-prompt synchronisation.
//!
//! Seed templates live as files under a directory, one file per named
//! template. The filename suffix (`.ideas.md` / `.drafts.md`) selects the
//! `PromptType`; an optional `style_name: ...` frontmatter line sets the
//! drafts style. Both operations are idempotent: running them twice with
//! unchanged content leaves the same set of active prompts.

use std::path::Path;

use crate::domain::PromptType;
use crate::error::StorageError;
use crate::storage::{prompts, DbPool};

struct SeedFile {
    name: String,
    prompt_type: PromptType,
    style_name: Option<String>,
    template: String,
}

fn parse_seed_file(file_name: &str, raw: &str) -> Option<SeedFile> {
    let (stem, prompt_type) = if let Some(stem) = file_name.strip_suffix(".ideas.md") {
        (stem, PromptType::Ideas)
    } else if let Some(stem) = file_name.strip_suffix(".drafts.md") {
        (stem, PromptType::Drafts)
    } else {
        return None;
    };

    let (style_name, template) = split_frontmatter(raw);
    Some(SeedFile {
        name: stem.to_string(),
        prompt_type,
        style_name,
        template,
    })
}

/// Split a leading `---\nstyle_name: ...\n---\n` frontmatter block, if
/// present, from the template body.
fn split_frontmatter(raw: &str) -> (Option<String>, String) {
    let Some(rest) = raw.strip_prefix("---\n") else {
        return (None, raw.trim().to_string());
    };
    let Some(end) = rest.find("\n---\n") else {
        return (None, raw.trim().to_string());
    };
    let frontmatter = &rest[..end];
    let body = &rest[end + 5..];

    let style_name = frontmatter.lines().find_map(|line| {
        line.strip_prefix("style_name:").map(|v| v.trim().to_string())
    });

    (style_name, body.trim().to_string())
}

/// Upsert every named seed template under `dir`, globally (for `user_id =
/// None`, seeding templates for every known user is out of scope here — the
/// caller is expected to pass the target user id).
pub async fn sync_seed_prompts(pool: &DbPool, user_id: &str, dir: &Path) -> Result<usize, StorageError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(0),
    };

    let mut synced = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        let Ok(raw) = std::fs::read_to_string(&path) else { continue };
        let Some(seed) = parse_seed_file(file_name, &raw) else { continue };

        prompts::upsert(
            pool,
            || crate::domain::ObjectId::generate().to_string(),
            user_id,
            &seed.name,
            seed.prompt_type,
            seed.style_name,
            &seed.template,
        )
        .await?;
        synced += 1;
    }
    Ok(synced)
}

/// Deactivate every prompt the user owns that is not part of the seed set
/// under `dir`, then sync the seed set. Idempotent.
pub async fn reset_to_seed_prompts(pool: &DbPool, user_id: &str, dir: &Path) -> Result<usize, StorageError> {
    let seed_names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|e| e.file_name().to_str().map(ToString::to_string))
                .filter_map(|name| parse_seed_file(&name, "").map(|s| s.name))
                .collect()
        })
        .unwrap_or_default();

    for active in prompts::find_active_by_user_id_and_type(pool, user_id, PromptType::Ideas).await? {
        if !seed_names.contains(&active.name) {
            prompts::deactivate_by_user_id_and_name(pool, user_id, &active.name).await?;
        }
    }
    for active in prompts::find_active_by_user_id_and_type(pool, user_id, PromptType::Drafts).await? {
        if !seed_names.contains(&active.name) {
            prompts::deactivate_by_user_id_and_name(pool, user_id, &active.name).await?;
        }
    }

    sync_seed_prompts(pool, user_id, dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::storage::{init_test_db, users};

    #[test]
    fn parses_ideas_seed_file() {
        let seed = parse_seed_file("default.ideas.md", "Generate {ideas} for {name}").unwrap();
        assert_eq!(seed.name, "default");
        assert!(matches!(seed.prompt_type, PromptType::Ideas));
        assert!(seed.style_name.is_none());
    }

    #[test]
    fn parses_drafts_seed_file_with_frontmatter() {
        let raw = "---\nstyle_name: profesional\n---\nWrite about {idea}";
        let seed = parse_seed_file("default.drafts.md", raw).unwrap();
        assert_eq!(seed.style_name.as_deref(), Some("profesional"));
        assert_eq!(seed.template, "Write about {idea}");
    }

    #[test]
    fn ignores_unrelated_files() {
        assert!(parse_seed_file("readme.md", "content").is_none());
    }

    #[tokio::test]
    async fn sync_seed_prompts_is_idempotent() {
        let pool = init_test_db().await.unwrap();
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(&pool, &user).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.ideas.md"), "Generate {ideas} for {name}").unwrap();

        let first = sync_seed_prompts(&pool, "u1", dir.path()).await.unwrap();
        let second = sync_seed_prompts(&pool, "u1", dir.path()).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);

        let active = prompts::find_active_by_user_id_and_type(&pool, "u1", PromptType::Ideas)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn sync_seed_prompts_missing_dir_is_noop() {
        let pool = init_test_db().await.unwrap();
        let user = User::new("u1".to_string(), "a@b.com".to_string()).unwrap();
        users::insert(&pool, &user).await.unwrap();

        let synced = sync_seed_prompts(&pool, "u1", Path::new("/nonexistent/seed/dir")).await.unwrap();
        assert_eq!(synced, 0);
    }
}
