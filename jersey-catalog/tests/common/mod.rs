//! In-memory remote store shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use jersey_catalog::remote::{
    CatalogFilter, ProductId, RawBanner, RawCategory, RawLeague, RawLeagueLink, RawProduct,
    RawShippingZone, RawTeam, RawVariant, RemoteStore, SearchRequest, SortRow,
};
use jersey_catalog::{CatalogError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fake store that records how often each query runs
#[derive(Default)]
pub struct FakeStore {
    pub products: Mutex<Vec<RawProduct>>,
    pub categories: Vec<RawCategory>,
    pub leagues: Vec<RawLeague>,
    pub banners: Vec<RawBanner>,
    pub zones: Vec<RawShippingZone>,

    /// Canned ranking results by term
    pub rankings: HashMap<String, Vec<ProductId>>,
    pub ranking_fails: AtomicBool,

    pub calls: HashMap<&'static str, AtomicUsize>,
}

const QUERIES: [&str; 9] = [
    "products",
    "product_sort_rows",
    "products_by_ids",
    "featured_products",
    "categories",
    "leagues",
    "banners",
    "shipping_zones",
    "rank_products",
];

impl FakeStore {
    pub fn new(products: Vec<RawProduct>) -> Self {
        Self {
            products: Mutex::new(products),
            calls: QUERIES.iter().map(|q| (*q, AtomicUsize::new(0))).collect(),
            ..Self::default()
        }
    }

    pub fn with_ranking(mut self, term: &str, ids: &[&str]) -> Self {
        self.rankings
            .insert(term.to_string(), ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn calls(&self, query: &str) -> usize {
        self.calls[query].load(Ordering::SeqCst)
    }

    pub fn fail_ranking(&self) {
        self.ranking_fails.store(true, Ordering::SeqCst);
    }

    pub fn rename(&self, id: &str, name: &str) {
        let mut products = self.products.lock().unwrap();
        if let Some(product) = products.iter_mut().find(|p| p.id == id) {
            product.name = name.to_string();
        }
    }

    fn record(&self, query: &'static str) {
        self.calls[query].fetch_add(1, Ordering::SeqCst);
    }

    fn active(&self) -> Vec<RawProduct> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    fn matches(product: &RawProduct, filter: &CatalogFilter) -> bool {
        let category_ok = match &filter.category_id {
            Some(category) => product.category_id.as_ref() == Some(category),
            None => true,
        };
        let league_ok = match &filter.league_id {
            Some(league) => product.leagues.iter().any(|l| &l.league_id == league),
            None => true,
        };
        category_ok && league_ok
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn products(&self) -> Result<Vec<RawProduct>> {
        self.record("products");
        Ok(self.active())
    }

    async fn product_sort_rows(&self, filter: &CatalogFilter) -> Result<Vec<SortRow>> {
        self.record("product_sort_rows");
        Ok(self
            .active()
            .into_iter()
            .filter(|p| Self::matches(p, filter))
            .map(|p| SortRow {
                id: p.id,
                name: p.name,
                team_name: p.team.and_then(|t| t.name),
            })
            .collect())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<RawProduct>> {
        self.record("products_by_ids");
        // Deliberately reversed: set-membership queries promise no order
        let mut found: Vec<RawProduct> = self
            .active()
            .into_iter()
            .filter(|p| ids.contains(&p.id))
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn featured_products(&self) -> Result<Vec<RawProduct>> {
        self.record("featured_products");
        Ok(self.active().into_iter().filter(|p| p.is_featured).collect())
    }

    async fn categories(&self) -> Result<Vec<RawCategory>> {
        self.record("categories");
        Ok(self.categories.clone())
    }

    async fn leagues(&self) -> Result<Vec<RawLeague>> {
        self.record("leagues");
        Ok(self.leagues.clone())
    }

    async fn banners(&self) -> Result<Vec<RawBanner>> {
        self.record("banners");
        Ok(self.banners.clone())
    }

    async fn shipping_zones(&self) -> Result<Vec<RawShippingZone>> {
        self.record("shipping_zones");
        Ok(self.zones.clone())
    }

    async fn rank_products(&self, request: &SearchRequest) -> Result<Vec<ProductId>> {
        self.record("rank_products");
        if self.ranking_fails.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport("ranking function unavailable".to_string()));
        }
        Ok(self
            .rankings
            .get(&request.term)
            .map(|ids| {
                ids.iter()
                    .skip(request.offset)
                    .take(request.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn variant(id: &str, price: f64, is_active: bool) -> RawVariant {
    RawVariant {
        id: id.to_string(),
        size: "M".to_string(),
        price,
        stock: Some(10),
        is_active,
    }
}

/// Active product with one active variant
pub fn product(id: &str, team: Option<&str>, name: &str) -> RawProduct {
    RawProduct {
        id: id.to_string(),
        name: name.to_string(),
        image_url: None,
        is_active: true,
        is_featured: false,
        featured_order: None,
        team_id: team.map(|t| format!("team-{}", t)),
        category_id: None,
        team: team.map(|t| RawTeam {
            id: format!("team-{}", t),
            name: Some(t.to_string()),
            logo_url: None,
        }),
        variants: vec![variant(&format!("{}-m", id), 100.0, true)],
        patches: Vec::new(),
        leagues: Vec::new(),
    }
}

pub fn in_category(mut product: RawProduct, category: &str) -> RawProduct {
    product.category_id = Some(category.to_string());
    product
}

pub fn in_league(mut product: RawProduct, league: &str) -> RawProduct {
    product.leagues.push(RawLeagueLink {
        league_id: league.to_string(),
    });
    product
}

/// `count` products in `category` spread over a handful of teams
pub fn catalog_of(count: usize, category: &str) -> Vec<RawProduct> {
    const TEAMS: [&str; 4] = ["Santa Fe", "America", "Nacional", "Junior"];
    (0..count)
        .map(|i| {
            let team = TEAMS[i % TEAMS.len()];
            in_category(product(&format!("p{:02}", i), Some(team), &format!("Kit {:02}", i)), category)
        })
        .collect()
}
