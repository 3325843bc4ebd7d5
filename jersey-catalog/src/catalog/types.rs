//! Catalog model served to storefront callers

use crate::cache::keys::{CacheKeyBuilder, Resource};
use crate::cache::types::CacheKey;
use crate::error::{CatalogError, Result};
use crate::remote::types::{CatalogFilter, ProductId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default number of products per catalog page
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Purchasable size of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub size: String,
    pub price: f64,
    pub stock: Option<i64>,
}

/// Customization patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// A jersey as shown in listings and detail views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub team_name: Option<String>,
    pub team_logo_url: Option<String>,
    /// Lowest price over active variants, 0 when none is active
    pub base_price: f64,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub featured_order: Option<i32>,
    pub team_id: Option<String>,
    pub category_id: Option<String>,
    pub league_ids: Vec<String>,
    /// Active variants only
    pub variants: Vec<Variant>,
    /// Active patches only
    pub patches: Vec<Patch>,
}

impl Product {
    /// Key used by the sorted listing
    pub fn sort_key(&self) -> SortKey {
        SortKey::new(self.team_name.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

/// Active categories and leagues, cached together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTaxonomy {
    pub categories: Vec<Category>,
    pub leagues: Vec<League>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub title: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: Option<i32>,
}

/// Delivery destination used at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingZone {
    pub id: String,
    pub department: String,
    pub municipality: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One page of results plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    /// Matches across all pages. Approximate on the search path.
    pub count: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, count: usize) -> Self {
        Self { data, count }
    }

    pub fn empty(count: usize) -> Self {
        Self {
            data: Vec::new(),
            count,
        }
    }
}

/// Request for one page of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub league_id: Option<String>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category_id: None,
            league_id: None,
        }
    }
}

impl CatalogQuery {
    /// Create a query for `page` with `limit` products per page
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        let query = Self {
            page,
            limit,
            ..Self::default()
        };
        query.validate()?;
        Ok(query)
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_league(mut self, league_id: impl Into<String>) -> Self {
        self.league_id = Some(league_id.into());
        self
    }

    /// Page and limit must both be at least 1
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(CatalogError::InvalidQuery("page must be at least 1".to_string()));
        }
        if self.limit == 0 {
            return Err(CatalogError::InvalidQuery("limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Trimmed search term; blank terms count as absent
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Index of the first product on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category_id: self.category_id.clone(),
            league_id: self.league_id.clone(),
        }
    }

    /// Page memo key of the normalized query
    pub fn cache_key(&self) -> CacheKey {
        CacheKeyBuilder::new(Resource::ProductPage)
            .param("page", self.page.to_string())
            .param("limit", self.limit.to_string())
            .param_opt("q", self.search_term())
            .param_opt("category", self.category_id.as_deref())
            .param_opt("league", self.league_id.as_deref())
            .build()
    }
}

/// Ordering key of the plain listing: team name, then product name.
///
/// Both parts are trimmed and lower-cased. Products without a team (or with a
/// blank one) sort after every named team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    team: Option<String>,
    name: String,
}

impl SortKey {
    pub fn new(team: Option<&str>, name: &str) -> Self {
        let team = team
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        Self {
            team,
            name: name.trim().to_lowercase(),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let team = match (&self.team, &other.team) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        team.then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_orders_team_then_name() {
        let a = SortKey::new(Some("Barcelona"), "Third Kit");
        let b = SortKey::new(Some("barcelona "), "home kit");
        let c = SortKey::new(Some("Arsenal"), "Zebra");

        assert!(c < b);
        assert!(b < a);
    }

    #[test]
    fn test_missing_team_sorts_last() {
        let named = SortKey::new(Some("Zulia FC"), "Away");
        let unnamed = SortKey::new(None, "Aaa");
        let blank = SortKey::new(Some("   "), "Aab");

        assert!(named < unnamed);
        assert!(unnamed < blank);
        assert_eq!(SortKey::new(Some(""), "x"), SortKey::new(None, "x"));
    }

    #[test]
    fn test_query_validation() {
        assert!(CatalogQuery::new(1, 24).is_ok());
        assert!(matches!(CatalogQuery::new(0, 24), Err(CatalogError::InvalidQuery(_))));
        assert!(matches!(CatalogQuery::new(1, 0), Err(CatalogError::InvalidQuery(_))));
    }

    #[test]
    fn test_query_offset() {
        assert_eq!(CatalogQuery::new(1, 24).unwrap().offset(), 0);
        assert_eq!(CatalogQuery::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_blank_search_is_absent() {
        let query = CatalogQuery::default().with_search("   ");
        assert_eq!(query.search_term(), None);

        let query = CatalogQuery::default().with_search("  messi ");
        assert_eq!(query.search_term(), Some("messi"));
    }

    #[test]
    fn test_cache_key_is_normalized() {
        let query = CatalogQuery::new(2, 24)
            .unwrap()
            .with_search(" retro ")
            .with_category("C1");
        assert_eq!(query.cache_key(), "catalog:page?page=2&limit=24&q=retro&category=C1");

        let blank = CatalogQuery::new(2, 24).unwrap().with_search("");
        assert_eq!(blank.cache_key(), "catalog:page?page=2&limit=24");
    }
}
