//! Loader backed by an in-memory class catalog.
use std::sync::Arc;

use async_trait::async_trait;
use sheet_content::ClassCatalog;
use sheet_core::{ClassData, FeatureDefinition};

use crate::api::{FeatureLoader, LoadError};

/// Serves definitions from a catalog loaded by `sheet-content`.
#[derive(Clone)]
pub struct CatalogFeatureLoader {
    catalog: Arc<ClassCatalog>,
}

impl CatalogFeatureLoader {
    pub fn new(catalog: ClassCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }
}

#[async_trait]
impl FeatureLoader for CatalogFeatureLoader {
    async fn load_class_features(
        &self,
        class_id: &str,
        level: u32,
        subclass: Option<&str>,
    ) -> Result<Vec<FeatureDefinition>, LoadError> {
        let class = self
            .catalog
            .by_id(class_id)
            .ok_or_else(|| LoadError::UnknownClass(class_id.to_string()))?;
        Ok(class.features_at(level, subclass).cloned().collect())
    }

    /// Unknown subclasses are not an error; they simply gate nothing.
    async fn load_class_data(
        &self,
        class_name: &str,
        _subclass: Option<&str>,
    ) -> Result<ClassData, LoadError> {
        self.catalog
            .find(class_name)
            .cloned()
            .ok_or_else(|| LoadError::UnknownClass(class_name.to_string()))
    }
}
