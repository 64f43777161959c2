//! Bounded in-memory store.
//!
//! LRU map with a maximum entry count and a per-entry time-to-live.
//! Expired entries are dropped lazily when read. Every operation takes a
//! short `parking_lot` lock, so callers share the store through `&self`
//! without any locking of their own.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct Slot<V> {
    value: V,
    expires_at: Instant,
    weight: usize,
}

struct Inner<V> {
    lru: LruCache<String, Slot<V>>,
    total_weight: usize,
}

/// Thread-safe LRU + TTL store keyed by string.
pub struct BoundedStore<V> {
    inner: Mutex<Inner<V>>,
    capacity: NonZeroUsize,
}

impl<V: Clone> BoundedStore<V> {
    /// Create a store holding at most `max_entries` values (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                lru: LruCache::new(capacity),
                total_weight: 0,
            }),
            capacity,
        }
    }

    /// Fetch a live value, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = inner.lru.peek(key)?.expires_at <= Instant::now();
        if expired {
            if let Some(slot) = inner.lru.pop(key) {
                inner.total_weight = inner.total_weight.saturating_sub(slot.weight);
            }
            return None;
        }
        inner.lru.get(key).map(|slot| slot.value.clone())
    }

    /// Insert or replace `key`. Evicts the least recently used entry when full.
    pub fn set(&self, key: impl Into<String>, value: V, weight: usize, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl.min(MAX_TTL))
            .or_else(|| now.checked_add(Duration::from_secs(24 * 60 * 60)))
            .unwrap_or(now);
        let slot = Slot {
            value,
            expires_at,
            weight,
        };
        let mut inner = self.inner.lock();
        inner.total_weight += weight;
        if let Some((_, old)) = inner.lru.push(key.into(), slot) {
            inner.total_weight = inner.total_weight.saturating_sub(old.weight);
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.lru.clear();
        inner.total_weight = 0;
    }

    /// Snapshot of live entries, most recently used first. Does not touch recency.
    pub fn entries(&self) -> Vec<(String, V)> {
        let now = Instant::now();
        self.inner
            .lock()
            .lru
            .iter()
            .filter(|(_, slot)| slot.expires_at > now)
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }

    /// Number of live entries. Expired entries are purged first.
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Sum of the weights passed to [`set`](Self::set) for stored entries.
    pub fn calculated_size(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.total_weight
    }
}

impl<V> Inner<V> {
    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .lru
            .iter()
            .filter(|(_, slot)| slot.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            if let Some(slot) = self.lru.pop(&key) {
                self.total_weight = self.total_weight.saturating_sub(slot.weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_set_get_and_replace() {
        let store = BoundedStore::new(4);
        store.set("a", 1, 10, MINUTE);
        assert_eq!(store.get("a"), Some(1));

        store.set("a", 2, 30, MINUTE);
        assert_eq!(store.get("a"), Some(2));
        assert_eq!(store.len(), 1);
        assert_eq!(store.calculated_size(), 30);
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let store = BoundedStore::new(2);
        store.set("a", 1, 1, MINUTE);
        store.set("b", 2, 1, MINUTE);
        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(store.get("a"), Some(1));
        store.set("c", 3, 1, MINUTE);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.get("c"), Some(3));
        assert_eq!(store.calculated_size(), 2);
    }

    #[test]
    fn test_expired_entries_are_dropped_on_read() {
        let store = BoundedStore::new(2);
        store.set("a", 1, 5, Duration::ZERO);
        assert!(store.entries().is_empty());
        assert_eq!(store.get("a"), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.calculated_size(), 0);
    }

    #[test]
    fn test_counts_agree_with_entries_after_expiry() {
        let store = BoundedStore::new(4);
        store.set("stale", 1, 7, Duration::ZERO);
        store.set("fresh", 2, 3, MINUTE);

        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.calculated_size(), 3);
        assert_eq!(store.get("fresh"), Some(2));
    }

    #[test]
    fn test_huge_ttl_is_clamped_instead_of_overflowing() {
        let store = BoundedStore::new(2);
        store.set("a", 1, 1, Duration::from_secs(u64::MAX));
        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = BoundedStore::new(2);
        store.set("a", 1, 1, MINUTE);
        store.clear();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.calculated_size(), 0);
        assert_eq!(store.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let store: BoundedStore<u8> = BoundedStore::new(0);
        assert_eq!(store.capacity(), 1);
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(BoundedStore::new(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(format!("{}-{}", t, i), i, 1, MINUTE);
                        let _ = store.get(&format!("{}-{}", t, i / 2));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 64);
        assert_eq!(store.calculated_size(), 64);
    }
}
