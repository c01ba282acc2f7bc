//! Feature definition cache.
//!
//! Definitions are cached per `(class id, level, subclass)` for a fixed TTL.
//! Expired entries are dropped lazily when read and periodically by a
//! background sweeper. Callers warm the cache ahead of need through a
//! prioritized preload queue that drains in small concurrent batches.
mod key;
mod store;

pub use key::{CacheKey, PreloadPriority, PreloadRequest};
pub use store::{CacheStats, DrainStats, FeatureDefinitionCache, Features};
