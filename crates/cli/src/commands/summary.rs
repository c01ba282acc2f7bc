//! Inspect pending migrations without changing anything.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;
use serde_json::json;
use sheet_core::migration::{get_migration_summary, is_outdated};

use super::{OutputFormat, display_name, load_characters};

/// Show what a migration would change
#[derive(Parser)]
pub struct Summary {
    /// Character JSON file (one document or an array)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Summary {
    pub fn execute(self) -> Result<()> {
        let characters = load_characters(&self.input)?;

        match self.format {
            OutputFormat::Json => {
                let rows: Vec<_> = characters
                    .iter()
                    .map(|character| {
                        json!({
                            "id": character.id,
                            "schema_version": character.schema_version,
                            "summary": get_migration_summary(character),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Summary => {
                let mut pending = 0;
                for character in &characters {
                    let summary = get_migration_summary(character);
                    let outdated = is_outdated(character);
                    if !summary.is_empty() || outdated {
                        pending += 1;
                    }

                    println!(
                        "{} {} (schema v{})",
                        style("▶").cyan(),
                        style(display_name(character)).bold(),
                        character.schema_version
                    );
                    println!(
                        "  legacy features: {} found, {} to migrate",
                        summary.total_features,
                        summary.features_to_migrate.len()
                    );
                    for feature in &summary.features_to_migrate {
                        println!("    - {}", style(feature).yellow());
                    }
                }

                println!();
                println!(
                    "{} of {} character(s) need migration",
                    style(pending).bold(),
                    characters.len()
                );
            }
        }

        Ok(())
    }
}
