//! Implementation of the `linkgen generate-drafts` command: either runs the
//! draft-generation use-case inline, or publishes a `DraftGenerationMessage`
//! for a running `serve` worker to pick up, mirroring the HTTP boundary's
//! `POST /v1/drafts/generate` (out of scope here, but the publish path it
//! would call is exercised through this command).

use linkgen_core::config::Config;
use linkgen_core::queue::{DraftGenerationMessage, Publisher};
use linkgen_core::usecases;
use tokio_util::sync::CancellationToken;

use crate::deps::RuntimeDeps;

use super::GenerateDraftsArgs;

pub async fn execute(config: &Config, args: GenerateDraftsArgs) -> anyhow::Result<()> {
    if args.via_queue {
        let stream_name = format!("{}-stream", config.queue.subject.replace('.', "-"));
        let publisher = Publisher::connect(&config.queue.url, &stream_name, &config.queue.subject)
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to queue: {e}"))?;
        let message = DraftGenerationMessage::new(args.user_id.clone(), Some(args.idea_id.clone()));
        publisher
            .publish(&message)
            .await
            .map_err(|e| anyhow::anyhow!("failed to publish job: {e}"))?;
        println!("published draft-generation job {}", message.job_id);
        return Ok(());
    }

    let deps = RuntimeDeps::build(config).await?;
    let cancel = CancellationToken::new();

    let drafts = usecases::generate_drafts(&deps.pool, &deps.llm, &cancel, &args.user_id, &args.idea_id)
        .await
        .map_err(|e| anyhow::anyhow!("draft generation failed: {e}"))?;

    println!("generated {} drafts:", drafts.len());
    for draft in drafts {
        let label = draft.title.as_deref().unwrap_or("(post)");
        println!("  [{}] {} ({:?})", draft.id, label, draft.draft_type);
    }
    Ok(())
}
