//! Detection, summary and folding of legacy fields into the usage map.
//!
//! Migration is additive: legacy keys stay on the character untouched and
//! only missing usage records are added, so running it again changes nothing.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::MigrationError;
use super::legacy::LEGACY_FIELDS;
use crate::character::Character;

/// What a migration would do, without doing it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Feature ids that would gain a usage record.
    pub features_to_migrate: Vec<String>,
    /// Recognized legacy features present on the character, migrated or not.
    pub total_features: usize,
}

impl MigrationSummary {
    pub fn is_empty(&self) -> bool {
        self.features_to_migrate.is_empty()
    }
}

/// Result of migrating one character.
#[derive(Clone, Debug, PartialEq)]
pub struct MigrationReport {
    pub character: Character,
    /// Feature ids that gained a record in this run.
    pub migrated: Vec<String>,
    /// Fields that could not be mapped; they stay unmigrated.
    pub failed: Vec<MigrationError>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// True iff a recognized legacy field is present and not yet in the usage map.
pub fn needs_migration(character: &Character) -> bool {
    LEGACY_FIELDS
        .iter()
        .any(|field| field.needs_migration(character))
}

/// Inspection only: which features a migration would add.
pub fn get_migration_summary(character: &Character) -> MigrationSummary {
    let present: Vec<_> = LEGACY_FIELDS
        .iter()
        .filter(|field| field.is_present(character))
        .collect();

    MigrationSummary {
        features_to_migrate: present
            .iter()
            .filter(|field| field.needs_migration(character))
            .map(|field| field.feature_id.to_string())
            .collect(),
        total_features: present.len(),
    }
}

/// Fold every pending legacy field into the usage map.
///
/// Fields that fail to map are skipped; the rest still migrate. Use
/// [`migrate_with_report`] to see which ones failed.
pub fn migrate_character_to_unified_usage(character: &Character) -> Character {
    migrate_with_report(character).character
}

/// Like [`migrate_character_to_unified_usage`], also reporting per-field results.
pub fn migrate_with_report(character: &Character) -> MigrationReport {
    let now = Utc::now();
    let mut usage = character.feature_usage.clone();
    let mut migrated = Vec::new();
    let mut failed = Vec::new();

    for field in LEGACY_FIELDS
        .iter()
        .filter(|field| field.needs_migration(character))
    {
        match field.to_record(character, now) {
            Ok(record) => {
                usage.insert(field.feature_id.to_string(), record);
                migrated.push(field.feature_id.to_string());
            }
            Err(err) => failed.push(err),
        }
    }

    MigrationReport {
        character: character.clone().with_usage(usage),
        migrated,
        failed,
    }
}
