//! Character aggregate and the snapshot formulas read from it.
//!
//! A [`Character`] owns exactly one [`UsageMap`]. Usage operations take the
//! character by reference and hand back a replacement map; callers swap it in
//! whole with [`Character::with_usage`] and never merge two maps.
//!
//! Legacy per-feature fields from older documents are kept verbatim in
//! [`Character::legacy`] (flattened into the serialized document) until the
//! migration engine mirrors them into the usage map.

pub mod abilities;
pub mod snapshot;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use abilities::{Ability, AbilityScores};
pub use snapshot::{CharacterSnapshot, ClassLevel, proficiency_bonus_for};

use crate::usage::UsageMap;

/// Schema version of documents written before the unified usage map existed.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

fn legacy_schema_version() -> u32 {
    LEGACY_SCHEMA_VERSION
}

/// A persisted character document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(flatten)]
    pub snapshot: CharacterSnapshot,
    #[serde(default)]
    pub feature_usage: UsageMap,
    /// Unrecognized top-level keys, including pre-unification feature fields.
    #[serde(flatten)]
    pub legacy: BTreeMap<String, serde_json::Value>,
}

impl Character {
    pub fn new(id: impl Into<String>, snapshot: CharacterSnapshot) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            schema_version: crate::migration::CURRENT_SCHEMA_VERSION,
            snapshot,
            feature_usage: UsageMap::new(),
            legacy: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set a raw legacy field, as an older document would carry it.
    pub fn with_legacy_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.legacy.insert(key.into(), value);
        self
    }

    /// Replace the usage map wholesale.
    pub fn with_usage(mut self, usage: UsageMap) -> Self {
        self.feature_usage = usage;
        self
    }

    pub fn snapshot(&self) -> &CharacterSnapshot {
        &self.snapshot
    }

    pub fn usage(&self) -> &UsageMap {
        &self.feature_usage
    }
}
