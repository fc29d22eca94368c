//! In-memory TTL cache
//!
//! Bounded by entry count. Expired entries are dropped on read, swept every
//! `SWEEP_INTERVAL` writes, and swept again before any capacity eviction.
//! When still full, the oldest write is evicted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::CacheStore;
use crate::constants::DEFAULT_CACHE_CAPACITY;

/// Writes between expiry sweeps
const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
    /// Write sequence, smallest is oldest
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    writes: u64,
}

impl Inner {
    fn sweep_expired(&mut self, now: Instant) {
        self.entries.retain(|_, e| e.expires_at > now);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.seq)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[derive(Debug)]
pub struct InMemoryCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live and expired entries not yet evicted
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let expired = inner.entries.get(key)?.expires_at <= Instant::now();
        if expired {
            inner.entries.remove(key);
            return None;
        }
        inner.entries.get(key).map(|e| e.value.clone())
    }

    fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.writes += 1;
        let seq = inner.writes;

        if seq % SWEEP_INTERVAL == 0 {
            inner.sweep_expired(now);
        }

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.capacity {
            inner.sweep_expired(now);
            while inner.entries.len() >= self.capacity {
                inner.evict_oldest();
            }
        }

        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
                seq,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let cache = InMemoryCache::new();
        assert!(cache.get("k").is_none());

        cache.set_with_ttl("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_expired_entry_evicted() {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("k", "v".to_string(), Duration::ZERO);

        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_swept_on_write() {
        let cache = InMemoryCache::new();
        for i in 0..10_000 {
            cache.set_with_ttl(&format!("k{}", i), "v".to_string(), Duration::ZERO);
        }
        assert!(cache.len() < SWEEP_INTERVAL as usize);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = InMemoryCache::with_capacity(3);
        for key in ["a", "b", "c", "d"] {
            cache.set_with_ttl(key, key.to_string(), Duration::from_secs(60));
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("d").as_deref(), Some("d"));

        // overwrite does not evict
        cache.set_with_ttl("b", "b2".to_string(), Duration::from_secs(60));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("c").as_deref(), Some("c"));
    }
}
