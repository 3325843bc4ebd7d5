//! # Jersey Catalog (jersey-catalog)
//!
//! Catalog data-access layer for a sports jersey storefront.
//!
//! ## Features
//!
//! - Two-tier stale-while-revalidate cache with family invalidation
//! - Sorted pagination that orders lightweight rows and hydrates only the page
//! - Relevance-ranked search that falls back to the sorted listing when the
//!   ranking function is unavailable
//! - REST backend for PostgREST-style stores
//!
//! ## Paginated Catalog
//!
//! ```no_run
//! use jersey_catalog::{CatalogClient, CatalogQuery, RestStore, RestStoreConfig, TieredCache, CacheConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = RestStore::new(RestStoreConfig::from_env()?)?;
//!     let client = CatalogClient::new(Arc::new(store), TieredCache::in_memory(CacheConfig::from_env()?));
//!
//!     let query = CatalogQuery::new(1, 24)?.with_category("C1");
//!     let page = client.fetch_catalog_page(&query).await?;
//!     println!("{} of {} products", page.data.len(), page.count);
//!     Ok(())
//! }
//! ```
//!
//! ## Invalidation
//!
//! Writers evict the family they touched; the next read refetches.
//!
//! ```no_run
//! use jersey_catalog::{CatalogClient, InvalidationScope};
//!
//! async fn after_product_update(client: &CatalogClient) {
//!     let event = client.invalidate(InvalidationScope::Catalog).await;
//!     println!("Evicted {} keys", event.keys.len());
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod error;
pub mod remote;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheEntry, CacheFamily, CacheKey, CacheKeyBuilder,
    CacheMode, CacheStats, FileSessionStore, InvalidationEvent, InvalidationReason,
    InvalidationScope, MemorySessionStore, SessionStore, TieredCache,
};
pub use catalog::{
    Banner, CatalogClient, CatalogQuery, CatalogTaxonomy, PaginatedResult, Product,
    ShippingZone, SortKey, ESTIMATED_SEARCH_COUNT,
};
pub use error::{CatalogError, Result};
pub use remote::{
    rest::{HealthCheckResult, HealthStatus},
    RemoteStore, RestStore, RestStoreConfig,
};
