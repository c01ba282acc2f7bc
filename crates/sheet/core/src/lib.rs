//! Character-sheet rules shared by the runtime, content loaders and tools.
//!
//! `sheet-core` is pure and synchronous: formulas derive resource caps from a
//! [`CharacterSnapshot`], the [`usage`] store mutates a character's unified
//! [`UsageMap`] by returning a replacement, and the [`migration`] engine folds
//! pre-unification fields into that map. Nothing here performs I/O or logs.
pub mod character;
pub mod config;
pub mod feature;
pub mod formula;
pub mod migration;
pub mod usage;

pub use character::{
    Ability, AbilityScores, Character, CharacterSnapshot, ClassLevel, LEGACY_SCHEMA_VERSION,
    proficiency_bonus_for,
};
pub use config::{CacheConfig, MigrationConfig, SheetConfig};
pub use feature::{
    ClassData, EnablementRule, FeatureDefinition, FeatureKind, FeatureType, OptionDefinition,
    ResetKind,
};
pub use formula::{Formula, evaluate};
pub use migration::{
    CURRENT_SCHEMA_VERSION, LEGACY_FIELDS, LegacyField, MigrationError, MigrationReport,
    MigrationSummary, get_migration_summary, migrate_character_to_unified_usage,
    migrate_with_report, needs_migration, upgrade,
};
pub use usage::{
    CustomState, FeatureConfig, LegacyConfig, OptionRef, SelectedOption, UsageError, UsageMap,
    UsagePatch, UsageRecord, UsageState,
};
