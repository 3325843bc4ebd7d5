//! Entry point used by storefront callers

use crate::cache::{
    key_for, CacheConfig, CacheMode, CacheStats, InvalidationEvent, InvalidationScope, Resource,
    SessionStore, TieredCache,
};
use crate::catalog::fetchers;
use crate::catalog::pagination;
use crate::catalog::types::{
    Banner, CatalogQuery, CatalogTaxonomy, PaginatedResult, Product, ShippingZone,
};
use crate::error::Result;
use crate::remote::RemoteStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cached access to the catalog.
///
/// Cloning is cheap and clones share the cache. [`bypassing_cache`] returns a
/// view that always refetches but still writes results back.
///
/// [`bypassing_cache`]: CatalogClient::bypassing_cache
#[derive(Clone)]
pub struct CatalogClient {
    store: Arc<dyn RemoteStore>,
    cache: TieredCache,
    mode: CacheMode,
}

impl CatalogClient {
    pub fn new(store: Arc<dyn RemoteStore>, cache: TieredCache) -> Self {
        Self {
            store,
            cache,
            mode: CacheMode::Cached,
        }
    }

    /// Build a client whose cache persists through `session`
    pub fn with_session(
        store: Arc<dyn RemoteStore>,
        config: CacheConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store, TieredCache::new(config, session)))
    }

    /// A view of this client that skips both cache tiers on reads
    pub fn bypassing_cache(&self) -> Self {
        Self {
            mode: CacheMode::Bypass,
            ..self.clone()
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }

    /// Every active product ordered by team then name
    pub async fn fetch_catalog(&self) -> Result<Vec<Product>> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(&key_for(Resource::Products), self.mode, move || async move {
                fetchers::fetch_products(store.as_ref()).await
            })
            .await
    }

    /// One page of the catalog.
    ///
    /// Pages are memoized briefly by normalized query. Pages served by the
    /// fallback listing after a failed search ranking are not memoized.
    pub async fn fetch_catalog_page(&self, query: &CatalogQuery) -> Result<PaginatedResult<Product>> {
        query.validate()?;
        let key = query.cache_key();

        if self.mode == CacheMode::Cached {
            if let Some(page) = self.cache.get_page::<PaginatedResult<Product>>(&key).await {
                return Ok(page);
            }
        }

        let outcome = pagination::paginate(self.store.as_ref(), query).await?;
        if outcome.fell_back {
            debug!("Not memoizing fallback page: {}", key);
        } else if let Err(e) = self.cache.put_page(&key, &outcome.page).await {
            warn!("Failed to memoize page {}: {}", key, e);
        }

        Ok(outcome.page)
    }

    /// Active categories and leagues
    pub async fn fetch_taxonomy(&self) -> Result<CatalogTaxonomy> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(&key_for(Resource::Taxonomy), self.mode, move || async move {
                fetchers::fetch_taxonomy(store.as_ref()).await
            })
            .await
    }

    /// Featured products by manual rank
    pub async fn fetch_featured(&self) -> Result<Vec<Product>> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(&key_for(Resource::Featured), self.mode, move || async move {
                fetchers::fetch_featured(store.as_ref()).await
            })
            .await
    }

    pub async fn fetch_banners(&self) -> Result<Vec<Banner>> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(&key_for(Resource::Banners), self.mode, move || async move {
                fetchers::fetch_banners(store.as_ref()).await
            })
            .await
    }

    pub async fn fetch_shipping_zones(&self) -> Result<Vec<ShippingZone>> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(&key_for(Resource::ShippingZones), self.mode, move || async move {
                fetchers::fetch_shipping_zones(store.as_ref()).await
            })
            .await
    }

    /// Evict a cache family after a write. The next reader refetches.
    pub async fn invalidate(&self, scope: InvalidationScope) -> InvalidationEvent {
        self.cache.invalidate(scope).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
