//! Cache statistics

use serde::{Deserialize, Serialize};

/// Counters for one cache since it was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    /// Entries dropped on read because their TTL had elapsed
    pub expirations: u64,
    /// Entries dropped to make room for newer ones
    pub evictions: u64,
    /// Entries currently held
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate as a percentage of lookups. Zero lookups reports 0.0.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }

        (self.hits as f64 / lookups as f64) * 100.0
    }

    /// Returns true if the cache is at capacity.
    pub fn is_full(&self) -> bool {
        self.entries >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_is_full() {
        let stats = CacheStats {
            entries: 2,
            capacity: 2,
            ..Default::default()
        };
        assert!(stats.is_full());
    }
}
