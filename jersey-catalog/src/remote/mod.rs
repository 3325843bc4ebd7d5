//! Query interface of the remote catalog store
//!
//! The catalog layer only reads. Every method returns active records unless
//! stated otherwise and lets transport errors propagate.

pub mod rest;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;

pub use rest::{RestStore, RestStoreConfig};
pub use types::{
    CatalogFilter, ProductId, RawBanner, RawCategory, RawLeague, RawLeagueLink, RawPatch,
    RawProduct, RawShippingZone, RawTeam, RawVariant, SearchRequest, SortRow,
};

/// Remote store the fetchers query
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every active product with full detail
    async fn products(&self) -> Result<Vec<RawProduct>>;

    /// Lightweight rows (id, name, team name) of active products matching
    /// `filter`. The league filter is an inner join on league membership.
    async fn product_sort_rows(&self, filter: &CatalogFilter) -> Result<Vec<SortRow>>;

    /// Full detail for the given ids. Order is not guaranteed and ids that do
    /// not resolve are simply absent.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<RawProduct>>;

    /// Active products flagged as featured
    async fn featured_products(&self) -> Result<Vec<RawProduct>>;

    async fn categories(&self) -> Result<Vec<RawCategory>>;

    async fn leagues(&self) -> Result<Vec<RawLeague>>;

    async fn banners(&self) -> Result<Vec<RawBanner>>;

    async fn shipping_zones(&self) -> Result<Vec<RawShippingZone>>;

    /// Relevance-ranked product ids, most relevant first. No total is
    /// reported.
    async fn rank_products(&self, request: &SearchRequest) -> Result<Vec<ProductId>>;
}
