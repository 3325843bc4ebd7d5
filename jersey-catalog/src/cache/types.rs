//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - `<family>:<resource>[?param=value&...]`
pub type CacheKey = String;

/// How a read treats the cached tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Serve from memory or the persisted tier when possible
    #[default]
    Cached,
    /// Skip both tiers and refetch unconditionally
    Bypass,
}

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Fresh reads served from the memory tier
    pub hits: u64,

    /// Reads served from the persisted tier (fresh or stale)
    pub persisted_hits: u64,

    /// Persisted reads that were older than the freshness window
    pub stale_hits: u64,

    /// Reads that found nothing in either tier
    pub misses: u64,

    /// Synchronous fetches awaited by a caller
    pub fetches: u64,

    /// Background refreshes spawned after a stale read
    pub background_refreshes: u64,

    /// Background refreshes that failed
    pub refresh_failures: u64,

    /// Persisted entries discarded because they could not be parsed
    pub corrupt_entries: u64,

    /// Keys evicted by invalidation
    pub invalidations: u64,

    /// Page memo hits
    pub page_hits: u64,

    /// Page memo misses (absent or older than the page TTL)
    pub page_misses: u64,

    /// Page memo entries evicted by the capacity bound
    pub page_evictions: u64,

    /// Number of entries currently in the memory tier
    pub entries: usize,
}

impl CacheStats {
    /// Share of reads answered without waiting on the network, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.persisted_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            (served as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, persisted_hits: {}, stale_hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, refreshes: {} }}",
            self.hits,
            self.persisted_hits,
            self.stale_hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.background_refreshes
        )
    }
}
