//! Two-tier cache store with stale-while-revalidate reads

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason, InvalidationScope},
    page::PageMemo,
    session::{MemorySessionStore, SessionStore},
    types::{CacheKey, CacheMode, CacheStats},
};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Outcome of consulting both tiers for a key
#[derive(Debug)]
enum Lookup {
    /// Younger than the freshness window
    Fresh(CacheEntry),
    /// Served from the persisted tier past the freshness window
    Stale(CacheEntry),
    Miss,
}

/// Cache with a volatile memory tier over a persisted session tier.
///
/// - Fresh memory entries are served without touching the network.
/// - Persisted entries are promoted into memory and served at any age; stale
///   ones additionally schedule a detached refresh.
/// - Misses await the fetcher and write the result to both tiers.
///
/// No lock is held while a fetcher runs, so concurrent misses on one key may
/// fetch twice. The last write wins and every write replaces a whole entry.
#[derive(Clone)]
pub struct TieredCache {
    config: Arc<CacheConfig>,

    /// Memory tier: key -> entry
    memory: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,

    /// Persisted tier
    persisted: Arc<dyn SessionStore>,

    /// Memoized catalog pages
    pages: Arc<RwLock<PageMemo>>,

    stats: Arc<RwLock<CacheStats>>,
}

impl TieredCache {
    /// Create a cache over the given persisted tier
    pub fn new(config: CacheConfig, persisted: Arc<dyn SessionStore>) -> Self {
        info!(
            "Initializing tiered cache (freshness: {:?}, page ttl: {:?}, page capacity: {})",
            config.freshness_window, config.page_ttl, config.page_capacity
        );

        let pages = PageMemo::new(config.page_capacity, config.page_ttl);
        Self {
            config: Arc::new(config),
            memory: Arc::new(RwLock::new(HashMap::new())),
            persisted,
            pages: Arc::new(RwLock::new(pages)),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    /// Create a cache whose persisted tier lives in process memory
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(config, Arc::new(MemorySessionStore::new()))
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read a value from either tier without fetching.
    ///
    /// Stale persisted values are returned as-is; only [`get_or_fetch`]
    /// can schedule a refresh.
    ///
    /// [`get_or_fetch`]: TieredCache::get_or_fetch
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.lookup(key).await {
            Lookup::Fresh(entry) | Lookup::Stale(entry) => self.decode_or_discard(&entry).await,
            Lookup::Miss => None,
        }
    }

    /// Write a value to both tiers with the current timestamp
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::from_value(key.to_string(), value)?;
        self.store_entry(entry).await;
        Ok(())
    }

    /// Serve `key` from cache, fetching on a miss.
    ///
    /// `fetcher` runs at most once: awaited on a miss or bypass, or detached
    /// in the background after a stale persisted hit.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, mode: CacheMode, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if mode == CacheMode::Bypass {
            debug!("Cache bypass: {}", key);
            return self.fetch_and_store(key, fetcher).await;
        }

        match self.lookup(key).await {
            Lookup::Fresh(entry) => match self.decode_or_discard(&entry).await {
                Some(value) => Ok(value),
                None => self.fetch_and_store(key, fetcher).await,
            },
            Lookup::Stale(entry) => match self.decode_or_discard(&entry).await {
                Some(value) => {
                    self.spawn_refresh(key.to_string(), fetcher).await;
                    Ok(value)
                }
                None => self.fetch_and_store(key, fetcher).await,
            },
            Lookup::Miss => self.fetch_and_store(key, fetcher).await,
        }
    }

    /// Evict every key matching `predicate` from both tiers and the page memo
    pub async fn invalidate_where<P>(&self, predicate: P) -> InvalidationEvent
    where
        P: Fn(&str) -> bool + Sync,
    {
        self.evict(&predicate, InvalidationReason::Predicate).await
    }

    /// Evict a whole family (or everything)
    pub async fn invalidate(&self, scope: InvalidationScope) -> InvalidationEvent {
        let event = self
            .evict(&|key: &str| scope.matches(key), InvalidationReason::Requested { scope })
            .await;
        info!(
            "Invalidated {} keys and {} pages for scope: {}",
            event.keys.len(),
            event.pages_dropped,
            scope
        );
        event
    }

    /// Look up a memoized page
    pub async fn get_page<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let hit = {
            let mut pages = self.pages.write().await;
            pages.get(key).map(|entry| entry.decode::<T>())
        };

        let mut stats = self.stats.write().await;
        match hit {
            Some(Ok(value)) => {
                debug!("Page memo hit: {}", key);
                stats.page_hits += 1;
                Some(value)
            }
            Some(Err(e)) => {
                warn!("Discarding undecodable page memo entry {}: {}", key, e);
                stats.page_misses += 1;
                drop(stats);
                self.pages.write().await.remove(key);
                None
            }
            None => {
                debug!("Page memo miss: {}", key);
                stats.page_misses += 1;
                None
            }
        }
    }

    /// Memoize a page
    pub async fn put_page<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::from_value(key.to_string(), value)?;
        let evicted = self.pages.write().await.insert(entry);
        if evicted > 0 {
            self.stats.write().await.page_evictions += evicted as u64;
        }
        Ok(())
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.memory.read().await.len();
        stats
    }

    /// Number of entries in the memory tier
    pub async fn len(&self) -> usize {
        self.memory.read().await.len()
    }

    /// Check if the memory tier is empty
    pub async fn is_empty(&self) -> bool {
        self.memory.read().await.is_empty()
    }

    /// Check if a key is held in memory (any age)
    pub async fn contains_key(&self, key: &str) -> bool {
        self.memory.read().await.contains_key(key)
    }

    /// Number of memoized pages
    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }

    fn persisted_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    fn strip_namespace<'a>(&self, persisted_key: &'a str) -> Option<&'a str> {
        persisted_key
            .strip_prefix(self.config.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    async fn lookup(&self, key: &str) -> Lookup {
        let window = self.config.freshness_window;

        let in_memory = self.memory.read().await.get(key).cloned();
        if let Some(entry) = in_memory {
            if entry.is_fresh(window) {
                debug!("Cache hit: {}", key);
                self.stats.write().await.hits += 1;
                return Lookup::Fresh(entry);
            }
            debug!("Memory entry stale, consulting persisted tier: {}", key);
        }

        let raw = match self.persisted.read(&self.persisted_key(key)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Persisted tier read failed for {}: {}", key, e);
                None
            }
        };

        let Some(raw) = raw else {
            debug!("Cache miss: {}", key);
            self.stats.write().await.misses += 1;
            return Lookup::Miss;
        };

        match CacheEntry::from_persisted(key.to_string(), &raw) {
            Ok(entry) => {
                self.memory
                    .write()
                    .await
                    .insert(key.to_string(), entry.clone());

                let mut stats = self.stats.write().await;
                stats.persisted_hits += 1;
                if entry.is_fresh(window) {
                    debug!("Persisted hit, promoted to memory: {}", key);
                    Lookup::Fresh(entry)
                } else {
                    debug!("Stale persisted hit ({:?} old): {}", entry.age(), key);
                    stats.stale_hits += 1;
                    Lookup::Stale(entry)
                }
            }
            Err(e) => {
                warn!("Discarding corrupt persisted entry {}: {}", key, e);
                {
                    let mut stats = self.stats.write().await;
                    stats.corrupt_entries += 1;
                    stats.misses += 1;
                }
                if let Err(e) = self.persisted.remove(&self.persisted_key(key)).await {
                    warn!("Failed to remove corrupt entry {}: {}", key, e);
                }
                Lookup::Miss
            }
        }
    }

    /// Decode an entry, dropping it from both tiers when its payload no longer
    /// matches the requested type
    async fn decode_or_discard<T: DeserializeOwned>(&self, entry: &CacheEntry) -> Option<T> {
        match entry.decode::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", entry.key, e);
                self.stats.write().await.corrupt_entries += 1;
                self.evict(
                    &|key: &str| key == entry.key,
                    InvalidationReason::Corrupt,
                )
                .await;
                None
            }
        }
    }

    async fn store_entry(&self, entry: CacheEntry) {
        let persisted_key = self.persisted_key(&entry.key);
        let encoded = entry.to_persisted();
        let key = entry.key.clone();

        self.memory.write().await.insert(key.clone(), entry);

        // The memory tier stays authoritative when the persisted tier rejects
        // a write (full, unavailable).
        match encoded {
            Ok(raw) => {
                if let Err(e) = self.persisted.write(&persisted_key, raw).await {
                    warn!("Persisted tier write failed for {}: {}", key, e);
                }
            }
            Err(e) => warn!("Failed to encode cache entry {}: {}", key, e),
        }
    }

    async fn fetch_and_store<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.stats.write().await.fetches += 1;
        let value = fetcher().await?;

        if let Err(e) = self.set(key, &value).await {
            warn!("Fetched value for {} could not be cached: {}", key, e);
        }
        Ok(value)
    }

    async fn spawn_refresh<T, F, Fut>(&self, key: CacheKey, fetcher: F)
    where
        T: Serialize + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.stats.write().await.background_refreshes += 1;
        debug!("Scheduling background refresh: {}", key);

        let cache = self.clone();
        // Detached: the handle is dropped and nobody joins it
        tokio::spawn(async move {
            match fetcher().await {
                Ok(value) => match cache.set(&key, &value).await {
                    Ok(()) => debug!("Background refresh stored: {}", key),
                    Err(e) => warn!("Background refresh for {} could not be cached: {}", key, e),
                },
                Err(e) => {
                    warn!("Background refresh failed for {}: {}", key, e);
                    cache.stats.write().await.refresh_failures += 1;
                }
            }
        });
    }

    async fn evict(
        &self,
        predicate: &(dyn Fn(&str) -> bool + Sync),
        reason: InvalidationReason,
    ) -> InvalidationEvent {
        let mut evicted: BTreeSet<CacheKey> = BTreeSet::new();

        {
            let mut memory = self.memory.write().await;
            let doomed: Vec<CacheKey> = memory.keys().filter(|k| predicate(k.as_str())).cloned().collect();
            for key in doomed {
                memory.remove(&key);
                evicted.insert(key);
            }
        }

        match self.persisted.keys().await {
            Ok(keys) => {
                for persisted_key in keys {
                    let Some(key) = self.strip_namespace(&persisted_key) else {
                        continue;
                    };
                    if !predicate(key) {
                        continue;
                    }
                    let key = key.to_string();
                    match self.persisted.remove(&persisted_key).await {
                        Ok(()) => {
                            evicted.insert(key);
                        }
                        Err(e) => warn!("Failed to evict persisted entry {}: {}", key, e),
                    }
                }
            }
            Err(e) => warn!("Could not list persisted tier during invalidation: {}", e),
        }

        let pages_dropped = self.pages.write().await.remove_where(predicate).len();

        self.stats.write().await.invalidations += (evicted.len() + pages_dropped) as u64;

        InvalidationEvent::new(reason, evicted.into_iter().collect()).with_pages_dropped(pages_dropped)
    }
}
