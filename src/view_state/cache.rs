//! LRU cache for computed item attributes.
//!
//! Keyed by [`Fingerprint`], so an entry never has to be patched: any change
//! to an item, its neighbors or the context produces a different key. The
//! cache is a cloneable handle; the engine and background prefetch jobs
//! share one instance.

use super::attributes::ItemAttributes;
use super::fingerprint::Fingerprint;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cache sizing parameters (`[cache]` config section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Lower bound on capacity (default: 1000).
    pub min_capacity: usize,
    /// Capacity per visible item (default: 8).
    pub window_multiple: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_capacity: 1000,
            window_multiple: 8,
        }
    }
}

impl CacheConfig {
    /// Capacity for a visible window of `visible_len` items.
    pub fn capacity_for(&self, visible_len: usize) -> NonZeroUsize {
        let wanted = self
            .min_capacity
            .max(visible_len.saturating_mul(self.window_multiple));
        NonZeroUsize::new(wanted).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Entries dropped by explicit invalidation.
    pub invalidations: u64,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<Fingerprint, ItemAttributes>,
    epoch: u64,
    stats: CacheStats,
}

/// Shared, bounded map from fingerprint to attributes.
///
/// Values are `Copy`, so a reader never observes a half-written entry.
/// Repeated puts for one fingerprint are idempotent; last write wins.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    inner: Arc<Mutex<Inner>>,
}

impl LayoutCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(capacity),
                epoch: 0,
                stats: CacheStats::default(),
            })),
        }
    }

    /// Create a cache sized for an empty visible window.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity_for(0).get())
    }

    /// Look up attributes, marking the entry most recently used.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ItemAttributes> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(fingerprint).copied();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        found
    }

    /// Look up attributes without touching LRU order or counters.
    pub fn peek(&self, fingerprint: &Fingerprint) -> Option<ItemAttributes> {
        self.inner.lock().entries.peek(fingerprint).copied()
    }

    /// Store attributes. Evicts the least recently used entry when full.
    pub fn put(&self, fingerprint: Fingerprint, attributes: ItemAttributes) {
        let mut inner = self.inner.lock();
        Self::insert(&mut inner, fingerprint, attributes);
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.entries.pop(fingerprint).is_some();
        if removed {
            inner.stats.invalidations += 1;
        }
        removed
    }

    /// Drop every entry and start a new epoch.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.entries.len() as u64;
        inner.entries.clear();
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.stats.invalidations += dropped;
    }

    /// Current epoch. Bumped by every [`invalidate_all`](Self::invalidate_all).
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Store a batch computed against `epoch`.
    ///
    /// The batch is discarded when the cache has moved to a newer epoch in
    /// the meantime. Returns whether it was merged.
    pub fn merge(
        &self,
        epoch: u64,
        batch: impl IntoIterator<Item = (Fingerprint, ItemAttributes)>,
    ) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return false;
        }
        for (fingerprint, attributes) in batch {
            Self::insert(&mut inner, fingerprint, attributes);
        }
        true
    }

    /// Change the capacity, evicting least recently used entries if needed.
    pub fn resize(&self, capacity: NonZeroUsize) {
        let mut inner = self.inner.lock();
        if inner.entries.cap() == capacity {
            return;
        }
        let before = inner.entries.len();
        inner.entries.resize(capacity);
        let evicted = before.saturating_sub(inner.entries.len()) as u64;
        inner.stats.evictions += evicted;
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    fn insert(inner: &mut Inner, fingerprint: Fingerprint, attributes: ItemAttributes) {
        if let Some((displaced, _)) = inner.entries.push(fingerprint, attributes) {
            if displaced != fingerprint {
                inner.stats.evictions += 1;
            }
        }
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
