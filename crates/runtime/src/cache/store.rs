use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};
use std::time::Duration;

use sheet_core::{CacheConfig, CharacterSnapshot, FeatureDefinition};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::key::{CacheKey, PreloadPriority, PreloadRequest};
use crate::api::{FeatureLoader, LoadError};

/// Shared, immutable list of definitions as stored in the cache.
pub type Features = Arc<[FeatureDefinition]>;

struct Entry {
    features: Features,
    stored_at: Instant,
}

fn is_fresh(entry: &Entry, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(entry.stored_at) <= ttl
}

/// Point-in-time view of the cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    /// Rendered keys, sorted.
    pub keys: Vec<String>,
    pub queued: usize,
    pub draining: bool,
}

/// Outcome of one preload drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub loaded: usize,
    /// Requests already satisfied by the time their batch ran.
    pub skipped: usize,
    pub failed: usize,
}

struct Shared {
    loader: Arc<dyn FeatureLoader>,
    config: CacheConfig,
    entries: RwLock<HashMap<CacheKey, Entry>>,
    queue: Mutex<Vec<PreloadRequest>>,
    draining: AtomicBool,
}

/// Releases the drain latch when the drain ends, including on panic or cancellation.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Shared {
    // Entries are plain values, so a poisoned lock is still safe to use.
    fn entries(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue(&self) -> MutexGuard<'_, Vec<PreloadRequest>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_fresh(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        self.entries()
            .get(key)
            .is_some_and(|entry| is_fresh(entry, now, self.config.ttl()))
    }

    fn insert(&self, key: CacheKey, features: Features) {
        self.entries_mut().insert(
            key,
            Entry {
                features,
                stored_at: Instant::now(),
            },
        );
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.ttl();
        let mut entries = self.entries_mut();
        let before = entries.len();
        entries.retain(|_, entry| is_fresh(entry, now, ttl));
        before - entries.len()
    }

    async fn drain(self: &Arc<Self>) -> Option<DrainStats> {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            debug!("preload drain already in progress");
            return None;
        };

        let mut requests = std::mem::take(&mut *self.queue());
        // Stable: equal priorities keep their enqueue order.
        requests.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut stats = DrainStats::default();
        if requests.is_empty() {
            return Some(stats);
        }

        let batch_size = self.config.effective_batch_size();
        let batches: Vec<Vec<PreloadRequest>> =
            requests.chunks(batch_size).map(<[_]>::to_vec).collect();
        info!(
            requests = requests.len(),
            batches = batches.len(),
            "draining preload queue"
        );

        let last = batches.len() - 1;
        for (index, batch) in batches.into_iter().enumerate() {
            let mut tasks = JoinSet::new();
            for request in batch {
                if self.has_fresh(&request.key) {
                    stats.skipped += 1;
                    continue;
                }
                let shared = Arc::clone(self);
                tasks.spawn(async move {
                    let key = request.key;
                    let result = shared
                        .loader
                        .load_class_features(&key.class_id, key.level, key.subclass())
                        .await;
                    (key, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((key, Ok(features))) => {
                        debug!(%key, count = features.len(), "preloaded feature definitions");
                        self.insert(key, features.into());
                        stats.loaded += 1;
                    }
                    Ok((key, Err(err))) => {
                        warn!(%key, error = %err, "preload failed");
                        stats.failed += 1;
                    }
                    Err(err) => {
                        warn!(error = %err, "preload task did not complete");
                        stats.failed += 1;
                    }
                }
            }

            if index < last {
                time::sleep(self.config.batch_pause()).await;
            }
        }

        info!(
            loaded = stats.loaded,
            skipped = stats.skipped,
            failed = stats.failed,
            "preload queue drained"
        );
        Some(stats)
    }
}

async fn sweep(shared: Weak<Shared>, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let removed = shared.purge_expired();
        if removed > 0 {
            debug!(removed, "swept expired feature definitions");
        }
    }
}

/// Session-scoped cache of feature definitions.
///
/// Construct one per session with [`FeatureDefinitionCache::start`] and
/// dispose of it at session end; dropping it has the same effect.
pub struct FeatureDefinitionCache {
    shared: Arc<Shared>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl FeatureDefinitionCache {
    /// Create the cache and spawn its sweeper on the current tokio runtime.
    pub fn start(loader: Arc<dyn FeatureLoader>, config: CacheConfig) -> Self {
        let period = config.sweep_interval();
        info!(
            ttl_secs = config.ttl_secs,
            sweep_interval_secs = period.as_secs(),
            batch_size = config.effective_batch_size(),
            "starting feature definition cache"
        );

        let shared = Arc::new(Shared {
            loader,
            config,
            entries: RwLock::new(HashMap::new()),
            queue: Mutex::new(Vec::new()),
            draining: AtomicBool::new(false),
        });
        let sweeper = tokio::spawn(sweep(Arc::downgrade(&shared), period));

        Self {
            shared,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Cached definitions, or `None` on a miss. An expired entry is purged on read.
    pub fn get(&self, class_id: &str, level: u32, subclass: Option<&str>) -> Option<Features> {
        let key = CacheKey::new(class_id, level, subclass);
        let now = Instant::now();
        let ttl = self.shared.config.ttl();

        {
            let entries = self.shared.entries();
            match entries.get(&key) {
                None => {
                    debug!(%key, "feature cache miss");
                    return None;
                }
                Some(entry) if is_fresh(entry, now, ttl) => {
                    debug!(%key, "feature cache hit");
                    return Some(Arc::clone(&entry.features));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.shared.entries_mut();
        if entries
            .get(&key)
            .is_some_and(|entry| !is_fresh(entry, now, ttl))
        {
            entries.remove(&key);
            debug!(%key, "feature cache entry expired");
        }
        None
    }

    /// Store definitions under the exact key, replacing any previous entry.
    pub fn set(
        &self,
        class_id: &str,
        level: u32,
        features: Vec<FeatureDefinition>,
        subclass: Option<&str>,
    ) {
        self.shared
            .insert(CacheKey::new(class_id, level, subclass), features.into());
    }

    /// Queue a preload. Returns `false` when the key is already cached or queued.
    pub fn preload(
        &self,
        class_id: &str,
        level: u32,
        subclass: Option<&str>,
        priority: PreloadPriority,
    ) -> bool {
        let key = CacheKey::new(class_id, level, subclass);
        if self.shared.has_fresh(&key) {
            return false;
        }

        let mut queue = self.shared.queue();
        if queue.iter().any(|request| request.key == key) {
            return false;
        }
        debug!(%key, %priority, "queued preload");
        queue.push(PreloadRequest { key, priority });
        true
    }

    /// Drain the preload queue once, highest priority first.
    ///
    /// Returns `None` without doing anything if another drain is running.
    /// Requests queued meanwhile wait for the next drain.
    pub async fn process_preload_queue(&self) -> Option<DrainStats> {
        self.shared.drain().await
    }

    /// Queue one preload per distinct class entry of `characters`, then drain.
    ///
    /// Each character's primary class is queued at high priority, the rest at
    /// medium. Classes whose id cannot be resolved are skipped.
    pub async fn preload_for_characters(
        &self,
        characters: &[CharacterSnapshot],
    ) -> Option<DrainStats> {
        let mut resolved: HashMap<(String, Option<String>), Option<String>> = HashMap::new();

        for character in characters {
            let primary = character.primary_class();
            for class in &character.classes {
                let subclass = class.subclass.as_deref();
                let memo = (
                    class.class_name.to_ascii_lowercase(),
                    class.subclass.clone(),
                );

                let class_id = match resolved.get(&memo) {
                    Some(id) => id.clone(),
                    None => {
                        let id = match self.resolve_class_id(&class.class_name, subclass).await {
                            Ok(id) => Some(id),
                            Err(err) => {
                                warn!(
                                    class = %class.class_name,
                                    error = %err,
                                    "skipping preload for unresolved class"
                                );
                                None
                            }
                        };
                        resolved.insert(memo, id.clone());
                        id
                    }
                };
                let Some(class_id) = class_id else {
                    continue;
                };

                let priority = if primary.is_some_and(|primary| std::ptr::eq(primary, class)) {
                    PreloadPriority::High
                } else {
                    PreloadPriority::Medium
                };
                self.preload(&class_id, class.level, subclass, priority);
            }
        }

        self.process_preload_queue().await
    }

    /// Cached definitions, loading and caching them on a miss.
    ///
    /// Loader errors are returned as-is and nothing is cached for them.
    pub async fn get_or_load(
        &self,
        class_id: &str,
        level: u32,
        subclass: Option<&str>,
    ) -> Result<Features, LoadError> {
        if let Some(features) = self.get(class_id, level, subclass) {
            return Ok(features);
        }

        let features: Features = self
            .shared
            .loader
            .load_class_features(class_id, level, subclass)
            .await?
            .into();
        self.shared
            .insert(CacheKey::new(class_id, level, subclass), Arc::clone(&features));
        Ok(features)
    }

    /// Canonical definition id for a class display name.
    pub async fn resolve_class_id(
        &self,
        class_name: &str,
        subclass: Option<&str>,
    ) -> Result<String, LoadError> {
        self.shared
            .loader
            .load_class_data(class_name, subclass)
            .await
            .map(|class| class.id)
    }

    /// Remove every expired entry now. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        self.shared.purge_expired()
    }

    pub fn clear(&self) {
        self.shared.entries_mut().clear();
        self.shared.queue().clear();
    }

    pub fn get_stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self
            .shared
            .entries()
            .keys()
            .map(ToString::to_string)
            .collect();
        keys.sort();

        CacheStats {
            size: keys.len(),
            keys,
            queued: self.shared.queue().len(),
            draining: self.shared.draining.load(Ordering::Acquire),
        }
    }

    /// Clear the cache and stop the sweeper. Safe to call more than once.
    pub fn dispose(&self) {
        self.clear();
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.abort();
            info!("feature definition cache disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.sweeper
            .lock()
            .map(|sweeper| sweeper.is_none())
            .unwrap_or(true)
    }
}

impl Drop for FeatureDefinitionCache {
    fn drop(&mut self) {
        self.dispose();
    }
}
