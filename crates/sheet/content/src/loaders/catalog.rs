//! Class catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sheet_core::{ClassData, FeatureDefinition};

use crate::loaders::{LoadResult, read_file};

/// Class catalog structure for RON files.
///
/// Feature definitions are written in map syntax (`{"id": ..., "feature_type": ...}`)
/// because their type-specific fields are flattened next to the common ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassCatalog {
    pub classes: Vec<ClassData>,
}

impl ClassCatalog {
    pub fn new(classes: Vec<ClassData>) -> Self {
        Self { classes }
    }

    /// Class by display name or id, ignoring case.
    pub fn find(&self, name: &str) -> Option<&ClassData> {
        self.classes.iter().find(|class| class.matches_name(name))
    }

    /// Class by canonical definition id.
    pub fn by_id(&self, id: &str) -> Option<&ClassData> {
        self.classes.iter().find(|class| class.id == id)
    }

    /// Every feature definition across all classes.
    pub fn features(&self) -> impl Iterator<Item = &FeatureDefinition> {
        self.classes.iter().flat_map(|class| class.features.iter())
    }

    /// Definition by feature id.
    pub fn feature(&self, feature_id: &str) -> Option<&FeatureDefinition> {
        self.features().find(|feature| feature.id == feature_id)
    }
}

/// Loader for the class catalog.
pub struct ClassCatalogLoader;

impl ClassCatalogLoader {
    /// Load a catalog from a `.ron` or `.json` file, picked by extension.
    pub fn load(path: &Path) -> LoadResult<ClassCatalog> {
        let content = read_file(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_ron(&content),
        }
    }

    pub fn parse_ron(content: &str) -> LoadResult<ClassCatalog> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse class catalog RON: {}", e))
    }

    pub fn parse_json(content: &str) -> LoadResult<ClassCatalog> {
        serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse class catalog JSON: {}", e))
    }
}
