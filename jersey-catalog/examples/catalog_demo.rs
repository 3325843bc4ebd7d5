//! Catalog Demo Application
//!
//! Fetches the first catalog page twice against a live store to show the
//! page memo, then runs a search and prints cache statistics.
//!
//! Usage:
//!   cargo run --example catalog_demo -- [search term]
//!
//! Environment variables:
//!   CATALOG_API_URL            - REST endpoint of the catalog store (required)
//!   CATALOG_API_KEY            - API key (required)
//!   CATALOG_SESSION_DIR        - persisted tier directory (default: ./.catalog-session)
//!   CATALOG_CACHE_FRESHNESS_SECS, CATALOG_CACHE_PAGE_TTL_SECS,
//!   CATALOG_CACHE_PAGE_CAPACITY, CATALOG_CACHE_NAMESPACE - cache tuning
//!   RUST_LOG                   - log filter (default: info)

use jersey_catalog::{
    CacheConfig, CatalogClient, CatalogQuery, FileSessionStore, RestStore, RestStoreConfig,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== Jersey Catalog Demo ===");

    let store = RestStore::new(RestStoreConfig::from_env()?)?;

    let health = store.health_check().await;
    info!("Store status: {:?} ({}ms)", health.status, health.response_time_ms);
    if !health.status.is_operational() {
        warn!("Store not operational: {:?}", health.error);
    }

    let session_dir =
        std::env::var("CATALOG_SESSION_DIR").unwrap_or_else(|_| ".catalog-session".to_string());
    let session = Arc::new(FileSessionStore::open(&session_dir).await?);
    let client = CatalogClient::with_session(Arc::new(store), CacheConfig::from_env()?, session)?;

    info!("\n--- Taxonomy ---");
    let taxonomy = client.fetch_taxonomy().await?;
    info!(
        "{} categories, {} leagues",
        taxonomy.categories.len(),
        taxonomy.leagues.len()
    );

    info!("\n--- First page (twice) ---");
    let query = CatalogQuery::new(1, 24)?;
    for attempt in 1..=2 {
        let page = client.fetch_catalog_page(&query).await?;
        info!("Attempt {}: {} of {} products", attempt, page.data.len(), page.count);
    }

    if let Some(term) = std::env::args().nth(1) {
        info!("\n--- Search: {} ---", term);
        let page = client
            .fetch_catalog_page(&CatalogQuery::new(1, 12)?.with_search(term))
            .await?;
        for product in &page.data {
            info!(
                "  {} | {} | from {:.2}",
                product.team_name.as_deref().unwrap_or("-"),
                product.name,
                product.base_price
            );
        }
    }

    info!("\n--- Cache statistics ---");
    info!("{}", client.cache_stats().await);

    Ok(())
}
