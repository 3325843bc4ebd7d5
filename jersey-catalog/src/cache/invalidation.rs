//! Cache families and invalidation events
//!
//! Writers elsewhere in the storefront mutate catalog data and then evict the
//! family they touched. Eviction is synchronous and never refetches; the next
//! reader does.

use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named group of cache keys invalidated together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFamily {
    /// Product listings, memoized pages, featured list, banners
    Catalog,
    /// Categories, leagues, shipping zones
    Configuration,
}

impl CacheFamily {
    /// Key prefix shared by every key of the family
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheFamily::Catalog => "catalog",
            CacheFamily::Configuration => "configuration",
        }
    }

    /// Check whether a cache key belongs to this family
    pub fn owns(&self, key: &str) -> bool {
        key.split_once(':')
            .map(|(family, _)| family == self.as_str())
            .unwrap_or(false)
    }
}

impl fmt::Display for CacheFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an invalidation request evicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidationScope {
    /// Every cached key
    All,
    /// The catalog family only
    Catalog,
    /// The configuration family only
    Configuration,
}

impl InvalidationScope {
    /// Check whether a cache key falls inside this scope
    pub fn matches(&self, key: &str) -> bool {
        match self {
            InvalidationScope::All => true,
            InvalidationScope::Catalog => CacheFamily::Catalog.owns(key),
            InvalidationScope::Configuration => CacheFamily::Configuration.owns(key),
        }
    }
}

impl FromStr for InvalidationScope {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(InvalidationScope::All),
            "catalog" => Ok(InvalidationScope::Catalog),
            "configuration" | "config" => Ok(InvalidationScope::Configuration),
            other => Err(CatalogError::InvalidQuery(format!(
                "unknown cache family: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationScope::All => f.write_str("all"),
            InvalidationScope::Catalog => f.write_str("catalog"),
            InvalidationScope::Configuration => f.write_str("configuration"),
        }
    }
}

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Explicit eviction after a write
    Requested { scope: InvalidationScope },

    /// Arbitrary key predicate supplied by the caller
    Predicate,

    /// Persisted entry could not be parsed
    Corrupt,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::Requested { scope } => write!(f, "requested: {}", scope),
            InvalidationReason::Predicate => write!(f, "key predicate"),
            InvalidationReason::Corrupt => write!(f, "corrupt entry"),
        }
    }
}

/// Record of one invalidation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were evicted from either tier
    pub keys: Vec<String>,

    /// Memoized pages dropped alongside
    pub pages_dropped: usize,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, keys: Vec<String>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            keys,
            pages_dropped: 0,
        }
    }

    /// Record how many memoized pages were dropped
    pub fn with_pages_dropped(mut self, pages: usize) -> Self {
        self.pages_dropped = pages;
        self
    }
}
