use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Feature definition cache tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached definition list stays valid.
    pub ttl_secs: u64,
    /// Period of the background sweep that drops expired entries.
    pub sweep_interval_secs: u64,
    /// Concurrent loader calls per preload batch.
    pub batch_size: usize,
    /// Pause between two preload batches.
    pub batch_pause_ms: u64,
}

impl CacheConfig {
    pub const DEFAULT_TTL_SECS: u64 = 300;
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
    pub const DEFAULT_BATCH_SIZE: usize = 3;
    pub const DEFAULT_BATCH_PAUSE_MS: u64 = 100;

    pub fn new() -> Self {
        Self {
            ttl_secs: Self::DEFAULT_TTL_SECS,
            sweep_interval_secs: Self::DEFAULT_SWEEP_INTERVAL_SECS,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            batch_pause_ms: Self::DEFAULT_BATCH_PAUSE_MS,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Never zero; `tokio::time::interval` panics on a zero period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Batch size with a floor of one.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Migration batch tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Capacity of the progress broadcast channel.
    pub progress_capacity: usize,
}

impl MigrationConfig {
    pub const DEFAULT_PROGRESS_CAPACITY: usize = 64;
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            progress_capacity: Self::DEFAULT_PROGRESS_CAPACITY,
        }
    }
}

/// Top-level configuration, usually read from `sheet.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub cache: CacheConfig,
    pub migration: MigrationConfig,
}
