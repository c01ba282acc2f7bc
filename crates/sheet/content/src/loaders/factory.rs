//! Content factory for loading sheet data from a directory.

use std::path::{Path, PathBuf};

use sheet_core::{Character, SheetConfig};

use crate::loaders::{
    CharacterLoader, ClassCatalog, ClassCatalogLoader, ConfigLoader, LoadResult,
};

/// Loads all sheet content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── sheet.toml
/// ├── classes.ron
/// └── characters/
///     └── party.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load configuration from `sheet.toml`, or defaults when it is absent.
    pub fn load_config(&self) -> LoadResult<SheetConfig> {
        ConfigLoader::load_or_default(&self.data_dir.join("sheet.toml"))
    }

    /// Load the class catalog from `classes.ron`.
    ///
    /// # Returns
    ///
    /// Returns a ClassCatalog with every class and its feature definitions.
    pub fn load_catalog(&self) -> LoadResult<ClassCatalog> {
        ClassCatalogLoader::load(&self.data_dir.join("classes.ron"))
    }

    /// Load characters from `characters/{name}.json`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the character file (without `.json` extension)
    ///
    /// # Returns
    ///
    /// Returns every character in the file, whether it holds one document or
    /// an array.
    pub fn load_characters(&self, name: &str) -> LoadResult<Vec<Character>> {
        let path = self
            .data_dir
            .join("characters")
            .join(format!("{}.json", name));
        CharacterLoader::load(&path)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
