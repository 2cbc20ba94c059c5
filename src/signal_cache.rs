// =============================================================================
// Signal Cache — bounded LRU memoisation for deterministic signals
// =============================================================================
//
// `LruCache` is a plain single-owner map with least-recently-used eviction.
// `MemoCache` wraps it behind a parking_lot mutex and memoises a pure compute
// function. The compute runs outside the lock: concurrent misses on the same
// key may duplicate work, and the first value inserted wins so every caller
// observes the same output.
// =============================================================================

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// LruCache
// ---------------------------------------------------------------------------

struct Entry<V> {
    value: V,
    stamp: u64,
}

/// Fixed-capacity map that evicts the least-recently-used entry on overflow.
pub struct LruCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Access stamp -> key, oldest first.
    order: BTreeMap<u64, K>,
    capacity: usize,
    clock: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.order.remove(&entry.stamp);
        entry.stamp = stamp;
        self.order.insert(stamp, key.clone());
        Some(&entry.value)
    }

    /// Insert `value` unless `key` is already present. Returns the value that
    /// is cached for `key` afterwards.
    pub fn get_or_insert(&mut self, key: K, value: V) -> &V {
        let stamp = self.tick();

        if let Some(entry) = self.entries.get_mut(&key) {
            // Refresh recency; the existing value stays authoritative.
            self.order.remove(&entry.stamp);
            entry.stamp = stamp;
            self.order.insert(stamp, key.clone());
        } else {
            while self.entries.len() >= self.capacity {
                match self.order.pop_first() {
                    Some((_, oldest)) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            self.order.insert(stamp, key.clone());
            self.entries.insert(key.clone(), Entry { value, stamp });
        }

        &self.entries[&key].value
    }

    #[cfg(test)]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// MemoCache
// ---------------------------------------------------------------------------

/// Hit/miss counters for the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe memoisation of a pure function keyed by normalised input.
pub struct MemoCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing it with `compute` on a
    /// miss. `compute` must be pure.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(hit) = self.inner.lock().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute(&key);
        self.inner.lock().get_or_insert(key, value).clone()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.len(),
            capacity: inner.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Normalise raw text into a cache key: trim, then keep at most `limit`
/// characters.
pub fn normalize_snippet(text: &str, limit: usize) -> String {
    text.trim().chars().take(limit).collect()
}

/// Keep at most `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
