//! Catalog model, fetchers and pagination

pub mod client;
pub mod fetchers;
pub mod pagination;
pub mod types;

pub use client::CatalogClient;
pub use pagination::{
    order_ids, paginate, reconstruct_order, slice_page, PageOutcome, RankedPage, RankingStrategy,
    RelevanceRanking, SortedRanking, ESTIMATED_SEARCH_COUNT,
};
pub use types::{
    Banner, CatalogQuery, CatalogTaxonomy, Category, Coordinates, League, PaginatedResult, Patch,
    Product, ShippingZone, SortKey, Variant, DEFAULT_PAGE_SIZE,
};
