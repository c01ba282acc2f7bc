use serde::{Deserialize, Serialize};

use super::FeatureDefinition;

/// A class entry of the definition catalog.
///
/// `id` is the canonical definition id the cache keys on; `name` is what
/// characters store in their class list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subclasses: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureDefinition>,
}

impl ClassData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subclasses: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclasses.push(subclass.into());
        self
    }

    pub fn with_feature(mut self, feature: FeatureDefinition) -> Self {
        self.features.push(feature);
        self
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.id.eq_ignore_ascii_case(name)
    }

    pub fn has_subclass(&self, subclass: &str) -> bool {
        self.subclasses
            .iter()
            .any(|known| known.eq_ignore_ascii_case(subclass))
    }

    /// Features whose enablement rule admits the level and subclass.
    pub fn features_at<'a>(
        &'a self,
        level: u32,
        subclass: Option<&'a str>,
    ) -> impl Iterator<Item = &'a FeatureDefinition> + 'a {
        self.features
            .iter()
            .filter(move |feature| feature.enablement.admits(level, subclass))
    }
}
