//! Batch-migrate a character file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use console::style;
use sheet_content::CharacterLoader;
use sheet_core::Character;
use sheet_runtime::{MigrationBatch, MigrationStatus, next_progress};

use super::load_characters;
use crate::config::CliConfig;

/// Migrate legacy feature fields
#[derive(Parser)]
pub struct Migrate {
    /// Character JSON file (one document or an array)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Where to write the migrated characters (defaults to `<FILE>.migrated.json`)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Sheet configuration (overrides SHEET_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail when any character could not be fully migrated
    #[arg(long)]
    strict: bool,
}

impl Migrate {
    pub async fn execute(self, cli_config: &CliConfig) -> Result<()> {
        let config = cli_config.load_sheet_config(self.config.as_deref())?;
        let characters = load_characters(&self.input)?;

        let batch = MigrationBatch::new(&config.migration);
        let mut progress = batch.subscribe();
        let printer = tokio::spawn(async move {
            while let Some(event) = next_progress(&mut progress).await {
                let status = match &event.status {
                    MigrationStatus::Pending => continue,
                    MigrationStatus::Migrating => style("migrating").dim().to_string(),
                    MigrationStatus::Completed => style("completed").green().to_string(),
                    MigrationStatus::Error(message) => {
                        format!("{}: {}", style("error").red(), message)
                    }
                };
                eprintln!("  {} {}", event.character_id, status);
            }
        });

        let outcomes = batch.run(characters).await;
        // Closing the channel ends the printer.
        drop(batch);
        let _ = printer.await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        // Documents whose task failed are written back unchanged.
        let migrated: Vec<Character> = outcomes
            .iter()
            .filter_map(|outcome| outcome.document().cloned())
            .collect();

        let output = self.output.unwrap_or_else(|| default_output(&self.input));
        CharacterLoader::save(&output, &migrated)?;

        println!(
            "{} {} character(s) written to {} ({} with errors)",
            style("✓").green(),
            migrated.len(),
            output.display(),
            failed
        );

        if self.strict && failed > 0 {
            anyhow::bail!("{} character(s) were not fully migrated", failed);
        }
        Ok(())
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("characters");
    input.with_file_name(format!("{}.migrated.json", stem))
}
