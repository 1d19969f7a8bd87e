//! CLI subcommand argument definitions and implementations for LinkGen.

pub mod generate_drafts;
pub mod generate_ideas;
pub mod seed;
pub mod serve;

use clap::Args;

/// Arguments for the `serve` subcommand.
#[derive(Debug, Args)]
pub struct ServeArgs;

/// Arguments for the `seed` subcommand.
#[derive(Debug, Args)]
pub struct SeedArgs;

/// Arguments for the `generate-ideas` subcommand.
#[derive(Debug, Args)]
pub struct GenerateIdeasArgs {
    /// Owning user id.
    #[arg(long)]
    pub user_id: String,
    /// Topic id to generate ideas for.
    #[arg(long)]
    pub topic_id: String,
    /// Override the topic's default idea count.
    #[arg(long)]
    pub count: Option<u32>,
}

/// Arguments for the `generate-drafts` subcommand.
#[derive(Debug, Args)]
pub struct GenerateDraftsArgs {
    /// Owning user id.
    #[arg(long)]
    pub user_id: String,
    /// Idea id to turn into drafts.
    #[arg(long)]
    pub idea_id: String,
    /// Publish a queue job instead of generating inline.
    #[arg(long)]
    pub via_queue: bool,
}
