//! Environment-backed CLI configuration.
use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use sheet_content::ConfigLoader;
use sheet_core::SheetConfig;

/// Paths the CLI reads its inputs from.
///
/// Command line flags take precedence over these.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub config_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
}

impl CliConfig {
    pub const DEFAULT_CATALOG: &'static str = "data/classes.ron";

    /// Construct CLI configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SHEET_CONFIG` - Path to the TOML sheet configuration
    /// - `SHEET_CATALOG` - Path to the class catalog (default: `data/classes.ron`)
    pub fn from_env() -> Self {
        Self {
            config_path: read_env("SHEET_CONFIG"),
            catalog_path: read_env("SHEET_CATALOG"),
        }
    }

    /// Load the sheet configuration, or defaults when no file is configured.
    pub fn load_sheet_config(&self, flag: Option<&Path>) -> Result<SheetConfig> {
        match flag.or(self.config_path.as_deref()) {
            Some(path) => ConfigLoader::load(path),
            None => Ok(SheetConfig::default()),
        }
    }

    pub fn catalog_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.catalog_path.clone())
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CATALOG))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let config = CliConfig {
            config_path: None,
            catalog_path: Some(PathBuf::from("env/classes.ron")),
        };
        assert_eq!(config.catalog_path(None), PathBuf::from("env/classes.ron"));
        assert_eq!(
            config.catalog_path(Some(Path::new("flag.ron"))),
            PathBuf::from("flag.ron")
        );
        assert_eq!(
            CliConfig::default().catalog_path(None),
            PathBuf::from(CliConfig::DEFAULT_CATALOG)
        );
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.toml");
        std::fs::write(&path, "[cache]\nbatch_size = 8\n").unwrap();

        let config = CliConfig::default().load_sheet_config(Some(&path)).unwrap();
        assert_eq!(config.cache.batch_size, 8);
        assert_eq!(
            CliConfig::default().load_sheet_config(None).unwrap(),
            SheetConfig::default()
        );
    }
}
