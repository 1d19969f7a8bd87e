//! Implementation of the `linkgen generate-ideas` command: a one-shot
//! manual invocation of the idea-generation use-case, useful for operators
//! and smoke-testing an LLM endpoint.

use linkgen_core::config::Config;
use linkgen_core::usecases;
use tokio_util::sync::CancellationToken;

use crate::deps::RuntimeDeps;

use super::GenerateIdeasArgs;

pub async fn execute(config: &Config, args: GenerateIdeasArgs) -> anyhow::Result<()> {
    let deps = RuntimeDeps::build(config).await?;
    let cancel = CancellationToken::new();

    let ideas = usecases::generate_ideas(
        &deps.pool,
        &deps.llm,
        &cancel,
        &args.user_id,
        &args.topic_id,
        args.count,
    )
    .await
    .map_err(|e| anyhow::anyhow!("idea generation failed: {e}"))?;

    println!("generated {} ideas:", ideas.len());
    for idea in ideas {
        println!("  [{}] {}", idea.id, idea.content);
    }
    Ok(())
}
