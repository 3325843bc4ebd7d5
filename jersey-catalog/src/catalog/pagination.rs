//! Paginated catalog: rank ids, slice, then hydrate the slice
//!
//! Without a search term the whole filtered set is ordered locally from
//! lightweight rows and only the requested slice is fetched in full. With a
//! term the remote relevance function ranks one page of ids; if it fails the
//! plain path runs instead, ignoring the term.

use crate::catalog::fetchers;
use crate::catalog::types::{CatalogQuery, PaginatedResult, Product, SortKey};
use crate::error::Result;
use crate::remote::types::{ProductId, SearchRequest, SortRow};
use crate::remote::RemoteStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Count reported alongside relevance-ranked pages.
///
/// The ranking function exposes no total, so this is a fixed upper bound
/// rather than the true number of matches.
pub const ESTIMATED_SEARCH_COUNT: usize = 1000;

/// Ids for one page, in display order, plus the count to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPage {
    pub ids: Vec<ProductId>,
    pub count: usize,
}

/// Decides which product ids make up a page and in what order
#[async_trait]
pub trait RankingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rank(&self, store: &dyn RemoteStore, query: &CatalogQuery) -> Result<RankedPage>;
}

/// Team/name order over the full filtered set
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedRanking;

#[async_trait]
impl RankingStrategy for SortedRanking {
    fn name(&self) -> &'static str {
        "sorted"
    }

    async fn rank(&self, store: &dyn RemoteStore, query: &CatalogQuery) -> Result<RankedPage> {
        let rows = store.product_sort_rows(&query.filter()).await?;
        let ordered = order_ids(rows);
        let count = ordered.len();
        let ids = slice_page(&ordered, query.page, query.limit).to_vec();

        debug!(
            "Sorted ranking: {} matches, page {} has {}",
            count,
            query.page,
            ids.len()
        );
        Ok(RankedPage { ids, count })
    }
}

/// Remote relevance order for a search term
#[derive(Debug, Clone)]
pub struct RelevanceRanking {
    term: String,
}

impl RelevanceRanking {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }
}

#[async_trait]
impl RankingStrategy for RelevanceRanking {
    fn name(&self) -> &'static str {
        "relevance"
    }

    async fn rank(&self, store: &dyn RemoteStore, query: &CatalogQuery) -> Result<RankedPage> {
        let request = SearchRequest {
            term: self.term.clone(),
            filter: query.filter(),
            limit: query.limit as usize,
            offset: query.offset(),
        };

        let ranked = store.rank_products(&request).await?;

        let mut seen = HashSet::new();
        let ids: Vec<ProductId> = ranked
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .take(request.limit)
            .collect();

        let count = if ids.is_empty() { 0 } else { ESTIMATED_SEARCH_COUNT };
        debug!("Relevance ranking for {:?} returned {} ids", self.term, ids.len());
        Ok(RankedPage { ids, count })
    }
}

/// Order lightweight rows by [`SortKey`], keeping input order on ties
pub fn order_ids(rows: Vec<SortRow>) -> Vec<ProductId> {
    let mut keyed: Vec<(SortKey, ProductId)> = rows
        .into_iter()
        .map(|row| (SortKey::new(row.team_name.as_deref(), &row.name), row.id))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// The `[(page-1)*limit, page*limit)` window of `ids`; empty past the end
pub fn slice_page(ids: &[ProductId], page: u32, limit: u32) -> &[ProductId] {
    let limit = limit as usize;
    let start = (page.saturating_sub(1) as usize).saturating_mul(limit);
    if start >= ids.len() {
        return &[];
    }
    let end = start.saturating_add(limit).min(ids.len());
    &ids[start..end]
}

/// Walk `ids` in order, picking each hydrated product once.
///
/// Ids that did not hydrate are skipped.
pub fn reconstruct_order(ids: &[ProductId], hydrated: Vec<Product>) -> Vec<Product> {
    let mut by_id: HashMap<ProductId, Product> = hydrated
        .into_iter()
        .map(|product| (product.id.clone(), product))
        .collect();

    let products: Vec<Product> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    if products.len() < ids.len() {
        debug!(
            "{} of {} ids did not hydrate",
            ids.len() - products.len(),
            ids.len()
        );
    }
    products
}

/// Result of [`paginate`]
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub page: PaginatedResult<Product>,
    /// The relevance ranking failed and the plain listing was served instead
    pub fell_back: bool,
}

/// Serve one catalog page, falling back to the sorted listing when ranking a
/// search term fails
pub async fn paginate(store: &dyn RemoteStore, query: &CatalogQuery) -> Result<PageOutcome> {
    query.validate()?;

    let (ranked, fell_back) = match query.search_term() {
        Some(term) => {
            let relevance = RelevanceRanking::new(term);
            match relevance.rank(store, query).await {
                Ok(ranked) => (ranked, false),
                Err(e) => {
                    warn!(
                        "{} ranking failed, serving {} listing instead: {}",
                        relevance.name(),
                        SortedRanking.name(),
                        e
                    );
                    (SortedRanking.rank(store, query).await?, true)
                }
            }
        }
        None => (SortedRanking.rank(store, query).await?, false),
    };

    if ranked.ids.is_empty() {
        return Ok(PageOutcome {
            page: PaginatedResult::empty(ranked.count),
            fell_back,
        });
    }

    let hydrated = fetchers::hydrate(store, &ranked.ids).await?;
    let data = reconstruct_order(&ranked.ids, hydrated);

    Ok(PageOutcome {
        page: PaginatedResult::new(data, ranked.count),
        fell_back,
    })
}
