//! Command line driver for character sheet maintenance.
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Features, Migrate, Summary};
use config::CliConfig;

/// Character sheet tools
#[derive(Parser)]
#[command(name = "sheet")]
#[command(about = "Inspect, migrate and resolve character sheets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Migrate legacy feature fields into the unified usage map
    Migrate(Migrate),

    /// Resolve each character's class features and current caps
    Features(Features),

    /// Show what a migration would change, without changing anything
    Summary(Summary),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    setup_logging();

    let config = CliConfig::from_env();
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(cmd) => cmd.execute(&config).await,
        Command::Features(cmd) => cmd.execute(&config).await,
        Command::Summary(cmd) => cmd.execute(),
    }
}

/// Log to stderr so stdout stays clean for JSON output.
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
