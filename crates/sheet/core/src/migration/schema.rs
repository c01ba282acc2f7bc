//! Versioned document upgrades.
//!
//! Each step moves a document exactly one schema version forward. Documents
//! already at (or past) [`CURRENT_SCHEMA_VERSION`] pass through unchanged.

use crate::character::{Character, LEGACY_SCHEMA_VERSION};

use super::engine::migrate_character_to_unified_usage;

/// Schema version written by this crate.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// One forward step in the upgrade chain.
#[derive(Clone, Copy)]
pub struct UpgradeStep {
    pub from: u32,
    pub apply: fn(Character) -> Character,
}

const UPGRADE_STEPS: &[UpgradeStep] = &[UpgradeStep {
    from: LEGACY_SCHEMA_VERSION,
    apply: upgrade_v1_to_v2,
}];

/// v1 → v2: fold legacy feature fields into the unified usage map.
///
/// The version is bumped even if some fields fail to map; those stay in the
/// legacy bag and are still reported by `needs_migration`.
fn upgrade_v1_to_v2(character: Character) -> Character {
    let mut upgraded = migrate_character_to_unified_usage(&character);
    upgraded.schema_version = 2;
    upgraded
}

/// Whether `upgrade` would change the document's schema version.
pub fn is_outdated(character: &Character) -> bool {
    character.schema_version < CURRENT_SCHEMA_VERSION
}

/// Run every pending step in order.
pub fn upgrade(mut character: Character) -> Character {
    while is_outdated(&character) {
        let Some(step) = UPGRADE_STEPS
            .iter()
            .find(|step| step.from == character.schema_version)
        else {
            // Unknown pre-legacy version: treat it as legacy.
            character.schema_version = LEGACY_SCHEMA_VERSION.max(character.schema_version + 1);
            continue;
        };
        character = (step.apply)(character);
    }
    character
}
