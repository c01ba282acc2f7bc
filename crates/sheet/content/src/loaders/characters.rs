//! Character document loader.

use std::path::Path;

use serde::Deserialize;
use sheet_core::Character;

use crate::loaders::{LoadResult, read_file};

/// A characters file holds either one document or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum CharacterFile {
    Many(Vec<Character>),
    One(Box<Character>),
}

/// Loader for character documents from JSON files.
pub struct CharacterLoader;

impl CharacterLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<Character>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<Character>> {
        let file: CharacterFile = serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character JSON: {}", e))?;

        Ok(match file {
            CharacterFile::Many(characters) => characters,
            CharacterFile::One(character) => vec![*character],
        })
    }

    /// Write characters as a pretty-printed JSON array.
    pub fn save(path: &Path, characters: &[Character]) -> LoadResult<()> {
        let content = serde_json::to_string_pretty(characters)?;
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write file {}: {}", path.display(), e))
    }
}
