use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

/// Insertion-ordered identity -> entity cache shared by a view and its
/// iterators
///
/// Cloning a `LocalCache` yields another handle to the same storage. Every
/// operation takes the mutex for the duration of an in-memory update only;
/// callers must not hold a handle's lock across a remote call (the API never
/// exposes the guard).
///
/// Each `clear` starts a new generation. Writers that captured an earlier
/// generation via [`LocalCache::generation`] are ignored by
/// [`LocalCache::upsert_if_current`], so entries fetched before an
/// invalidation never leak into the fresh cache.
pub struct LocalCache<V> {
    inner: Arc<Mutex<LocalCacheInner<V>>>,
}

struct LocalCacheInner<V> {
    entries: BTreeMap<u64, (String, V)>, // insertion seq -> (identity, value)
    index: HashMap<String, u64>,         // identity -> insertion seq
    next_seq: u64,
    generation: u64,
    hits: u64,
    misses: u64,
}

impl<V: Clone> LocalCacheInner<V> {
    fn upsert(&mut self, id: String, value: V) {
        match self.index.get(&id) {
            Some(&seq) => {
                // Overwrite in place, keeping the original position
                self.entries.insert(seq, (id, value));
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(id.clone(), seq);
                self.entries.insert(seq, (id, value));
            }
        }
    }
}

impl<V: Clone> LocalCache<V> {
    pub fn new() -> Self {
        LocalCache {
            inner: Arc::new(Mutex::new(LocalCacheInner {
                entries: BTreeMap::new(),
                index: HashMap::new(),
                next_seq: 0,
                generation: 0,
                hits: 0,
                misses: 0,
            })),
        }
    }

    /// Insert or overwrite the entry for `id`
    pub fn upsert(&self, id: impl Into<String>, value: V) {
        self.inner.lock().upsert(id.into(), value);
    }

    /// Insert or overwrite, unless the cache was cleared after `generation`
    ///
    /// Returns whether the write was applied.
    pub fn upsert_if_current(&self, generation: u64, id: impl Into<String>, value: V) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            trace!(
                target: "pagedview::cache",
                stale = generation,
                current = inner.generation,
                "Ignoring write from a stale generation"
            );
            return false;
        }
        inner.upsert(id.into(), value);
        true
    }

    /// Get a value from the cache
    pub fn get(&self, id: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let found = inner
            .index
            .get(id)
            .and_then(|seq| inner.entries.get(seq))
            .map(|(_, value)| value.clone());
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    pub fn contains_key(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        let found = inner.index.contains_key(id);
        if found {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Remove the entry for `id`, no-op if absent
    pub fn remove(&self, id: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let seq = inner.index.remove(id)?;
        inner.entries.remove(&seq).map(|(_, value)| value)
    }

    /// Drop all entries and start a new generation
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.index.clear();
        inner.next_seq = 0;
        inner.generation += 1;
        debug!(
            target: "pagedview::cache",
            dropped,
            generation = inner.generation,
            "Cleared cache"
        );
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Values in insertion order, copied out under a single lock
    pub fn snapshot(&self) -> Vec<V> {
        let inner = self.inner.lock();
        inner.entries.values().map(|(_, value)| value.clone()).collect()
    }

    /// Identities in insertion order
    #[cfg(test)]
    fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner.entries.values().map(|(id, _)| id.clone()).collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            generation: inner.generation,
        }
    }

    /// Get current size
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl<V: Clone> Default for LocalCache<V> {
    fn default() -> Self {
        LocalCache::new()
    }
}

impl<V: Clone> Clone for LocalCache<V> {
    fn clone(&self) -> Self {
        LocalCache {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub generation: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
