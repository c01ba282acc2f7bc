//! Legacy field migration and schema upgrades.
//!
//! Pre-unification documents kept feature state in dedicated top-level fields.
//! [`engine`] folds those into the unified usage map without touching the
//! original keys; [`schema`] drives the versioned upgrade chain on top of it.

pub mod engine;
pub mod error;
pub mod legacy;
pub mod schema;

pub use engine::{
    MigrationReport, MigrationSummary, get_migration_summary, migrate_character_to_unified_usage,
    migrate_with_report, needs_migration,
};
pub use error::MigrationError;
pub use legacy::{LEGACY_FIELDS, LegacyCap, LegacyField, LegacyShape};
pub use schema::{CURRENT_SCHEMA_VERSION, UpgradeStep, is_outdated, upgrade};
