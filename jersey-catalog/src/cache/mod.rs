//! # Two-Tier Catalog Cache
//!
//! Keyed cache in front of the remote catalog store.
//!
//! ## Features
//!
//! - **Memory tier**: process-local map, served while younger than the freshness window
//! - **Persisted tier**: pluggable [`SessionStore`] holding `{data, timestamp}` documents
//! - **Stale-while-revalidate**: stale persisted entries are served at once and
//!   refreshed by a detached task
//! - **Page memo**: short-lived, bounded FIFO of paginated results
//! - **Family invalidation**: evict `catalog` or `configuration` keys after a write
//!
//! ## Example
//!
//! ```rust
//! use jersey_catalog::cache::{CacheConfig, CacheMode, InvalidationScope, TieredCache};
//! use std::time::Duration;
//!
//! # async fn example() -> jersey_catalog::Result<()> {
//! let config = CacheConfig::builder()
//!     .freshness_window(Duration::from_secs(600))
//!     .page_capacity(50)
//!     .build();
//!
//! let cache = TieredCache::in_memory(config);
//!
//! let banners: Vec<String> = cache
//!     .get_or_fetch("catalog:banners", CacheMode::Cached, || async {
//!         Ok(vec!["summer-sale".to_string()])
//!     })
//!     .await?;
//! assert_eq!(banners.len(), 1);
//!
//! cache.invalidate(InvalidationScope::Catalog).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod page;
pub mod session;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::CacheEntry;
pub use invalidation::{CacheFamily, InvalidationEvent, InvalidationReason, InvalidationScope};
pub use keys::{key_for, CacheKeyBuilder, Resource};
pub use page::PageMemo;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use store::TieredCache;
pub use types::{CacheKey, CacheMode, CacheStats};
