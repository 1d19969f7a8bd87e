//! Implementation of the `linkgen seed` command.

use linkgen_core::config::Config;
use linkgen_core::seeder;

use crate::deps::RuntimeDeps;

pub async fn execute(config: &Config) -> anyhow::Result<()> {
    let deps = RuntimeDeps::build(config).await?;
    seeder::run_dev_seed(&deps.pool)
        .await
        .map_err(|e| anyhow::anyhow!("dev seed failed: {e}"))?;
    println!("dev seed complete");
    Ok(())
}
