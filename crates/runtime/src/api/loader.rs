//! Asynchronous abstraction for sourcing feature definitions.
//!
//! The cache consults a [`FeatureLoader`] on misses and while preloading, so
//! the definitions can come from a bundled catalog, a remote service or a
//! test fixture.
use async_trait::async_trait;
use sheet_core::{ClassData, FeatureDefinition};

use super::errors::LoadError;

#[async_trait]
pub trait FeatureLoader: Send + Sync {
    /// Every feature of `class_id` enabled at `level` (and `subclass`, if any).
    async fn load_class_features(
        &self,
        class_id: &str,
        level: u32,
        subclass: Option<&str>,
    ) -> Result<Vec<FeatureDefinition>, LoadError>;

    /// Class entry for a display name, used to resolve its canonical id.
    async fn load_class_data(
        &self,
        class_name: &str,
        subclass: Option<&str>,
    ) -> Result<ClassData, LoadError>;
}
