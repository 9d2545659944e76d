//! Size-bounded cache with per-entry expiry.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::stats::CacheStats;

/// A cached value and the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub timestamp: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) >= ttl
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    stats: CacheStats,
}

/// Thread-safe cache with TTL expiry and oldest-first eviction.
///
/// Reads do not refresh an entry's position, so once the cache is full the
/// entry that was inserted longest ago is evicted first. Expired entries are
/// dropped lazily when read.
pub struct TtlCache<K: Hash + Eq, V> {
    name: &'static str,
    ttl: Duration,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache. A zero capacity is treated as one.
    pub fn new(name: &'static str, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            ttl,
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats {
                    capacity: capacity.get(),
                    ..Default::default()
                },
            }),
        }
    }

    /// Fetch a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.peek(key) {
            None => {
                inner.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(self.ttl, now),
        };

        if expired {
            inner.entries.pop(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            debug!(cache = self.name, "Cache entry expired");
            return None;
        }

        inner.stats.hits += 1;
        inner.entries.peek(key).map(|entry| entry.value.clone())
    }

    /// Store `value`, replacing any previous entry for `key`.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            timestamp: Instant::now(),
        };

        let mut inner = self.inner.lock();
        // Re-inserting must restart the entry's age, so drop the old slot first.
        inner.entries.pop(&key);
        if inner.entries.push(key, entry).is_some() {
            inner.stats.evictions += 1;
            debug!(cache = self.name, "Evicted oldest cache entry");
        }
        inner.stats.insertions += 1;
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().entries.pop(key).map(|entry| entry.value)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        debug!(cache = self.name, "Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> TtlCache<String, u32> {
        TtlCache::new("test", capacity, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_and_miss() {
        let cache = cache(4);
        assert_eq!(cache.get(&"a".to_string()), None);

        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = cache(4);
        cache.insert("a".to_string(), 1);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.stats().expirations, 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicts_oldest_first_even_after_reads() {
        let cache = cache(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        // Reads do not promote "a".
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        cache.insert("c".to_string(), 3);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinsert_refreshes_timestamp() {
        let cache = cache(4);
        cache.insert("a".to_string(), 1);
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.insert("a".to_string(), 2);
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get(&"a".to_string()), Some(2));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keeps_counters() {
        let cache = cache(4);
        cache.insert("a".to_string(), 1);
        cache.get(&"a".to_string());
        cache.clear();

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache: TtlCache<String, u32> = TtlCache::new("tiny", 0, Duration::from_secs(1));
        assert_eq!(cache.stats().capacity, 1);
    }
}
