//! Sheet configuration loader.

use std::path::Path;

use sheet_core::SheetConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`SheetConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing SheetConfig
    ///
    /// # Returns
    ///
    /// Returns a SheetConfig. Missing tables and keys take their defaults.
    pub fn load(path: &Path) -> LoadResult<SheetConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SheetConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }

    /// Like [`ConfigLoader::load`], but an absent file yields the defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to an optional TOML file
    ///
    /// # Returns
    ///
    /// Returns the parsed SheetConfig, or `SheetConfig::default()` when
    /// nothing exists at `path`.
    pub fn load_or_default(path: &Path) -> LoadResult<SheetConfig> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(SheetConfig::default())
        }
    }
}
