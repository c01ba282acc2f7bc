//! Async orchestration around the character-sheet core.
//!
//! This crate wires the pure rules of `sheet-core` to asynchronous feature
//! sources. Consumers start a [`FeatureDefinitionCache`] per session, feed it
//! through a [`FeatureLoader`], and run legacy documents through a
//! [`MigrationBatch`] while watching its progress events.
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the loader trait and error types
//! - [`cache`] hosts the definition cache and its preload queue
//! - [`providers`] holds loader implementations
//! - [`migration`] runs batch migrations
//! - [`session`] seeds usage maps from cached definitions
pub mod api;
pub mod cache;
pub mod migration;
pub mod providers;
pub mod session;

pub use api::{FeatureLoader, LoadError, Result, RuntimeError};
pub use cache::{
    CacheKey, CacheStats, DrainStats, FeatureDefinitionCache, Features, PreloadPriority,
    PreloadRequest,
};
pub use migration::{
    BatchOutcome, MigrationBatch, MigrationProgress, MigrationStatus, next_progress,
};
pub use providers::CatalogFeatureLoader;
pub use session::seed_character_features;
