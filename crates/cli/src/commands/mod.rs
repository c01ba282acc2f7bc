//! Subcommand implementations.
mod features;
mod migrate;
mod summary;

pub use features::Features;
pub use migrate::Migrate;
pub use summary::Summary;

use std::path::Path;

use anyhow::{Context, Result};
use sheet_content::CharacterLoader;
use sheet_core::Character;

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Summary,
    /// Full JSON output
    Json,
}

fn load_characters(path: &Path) -> Result<Vec<Character>> {
    let characters = CharacterLoader::load(path)
        .with_context(|| format!("Failed to load characters from {}", path.display()))?;
    if characters.is_empty() {
        anyhow::bail!("No characters found in {}", path.display());
    }
    Ok(characters)
}

fn display_name(character: &Character) -> &str {
    if character.name.is_empty() {
        &character.id
    } else {
        &character.name
    }
}
