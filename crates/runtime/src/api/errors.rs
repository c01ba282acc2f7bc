//! Error types surfaced by the runtime API.
//!
//! Loader failures pass through the cache unchanged; batch failures are kept
//! per character so one bad document never stops the rest.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failure reported by a [`FeatureLoader`](super::FeatureLoader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("feature source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Usage(#[from] sheet_core::UsageError),

    #[error("{count} legacy field(s) of `{character_id}` could not be migrated")]
    IncompleteMigration { character_id: String, count: usize },

    #[error("migration task for `{character_id}` failed")]
    MigrationTask {
        character_id: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
