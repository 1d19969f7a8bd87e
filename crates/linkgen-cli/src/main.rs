//! LinkGen CLI - draft-generation engine entrypoint.
//!
//! Entry point for the linkgen binary. Parses CLI arguments, initializes
//! logging, loads configuration, and dispatches to subcommand handlers.
mod commands;
mod deps;

use clap::Parser;
use linkgen_core::config::Config;
use tracing_subscriber::EnvFilter;

/// LinkedIn draft-generation engine
#[derive(Parser)]
#[command(name = "linkgen")]
#[command(version)]
#[command(about = "LinkedIn draft-generation engine")]
#[command(after_help = "\
Quick start:
  1. linkgen seed            — bootstrap a dev user, topics, and ideas
  2. linkgen generate-ideas  — manually generate ideas for a topic
  3. linkgen generate-drafts — manually turn an idea into drafts
  4. linkgen serve           — run the scheduler and queue consumer")]
struct Cli {
    /// Path to config.toml
    #[arg(short = 'c', long, global = true, default_value = "~/.linkgen/config.toml")]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the scheduler and queue consumer until a shutdown signal
    Serve(commands::ServeArgs),
    /// Bootstrap the canonical dev user, topics, and ideas
    Seed(commands::SeedArgs),
    /// Manually generate ideas for a topic
    GenerateIdeas(commands::GenerateIdeasArgs),
    /// Manually generate drafts from an idea
    GenerateDrafts(commands::GenerateDraftsArgs),
}

/// Common exit codes: 0 normal shutdown, 1 init failure, 2 config-validation failure.
const EXIT_INIT_FAILURE: u8 = 1;
const EXIT_CONFIG_INVALID: u8 = 2;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("linkgen=debug,linkgen_core=debug,info")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("linkgen=info,linkgen_core=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    let config = match Config::load_and_validate(Some(&cli.config)) {
        Ok(config) => config,
        Err(errors) => {
            for e in &errors {
                eprintln!("config error: {e}");
            }
            return std::process::ExitCode::from(EXIT_CONFIG_INVALID);
        }
    };

    let result = match cli.command {
        Commands::Serve(_) => commands::serve::execute(&config).await,
        Commands::Seed(_) => commands::seed::execute(&config).await,
        Commands::GenerateIdeas(args) => commands::generate_ideas::execute(&config, args).await,
        Commands::GenerateDrafts(args) => commands::generate_drafts::execute(&config, args).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::from(EXIT_INIT_FAILURE)
        }
    }
}
