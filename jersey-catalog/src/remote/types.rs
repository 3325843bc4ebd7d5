//! Row shapes returned by the remote catalog store
//!
//! Field names follow the aliases the REST backend selects; the fetchers
//! adapt these rows into the catalog model.

use serde::{Deserialize, Serialize};

/// Product identifier
pub type ProductId = String;

fn active_by_default() -> bool {
    true
}

/// Team embedded in a product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTeam {
    pub id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

/// Size/price variant of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVariant {
    pub id: String,
    pub size: String,
    pub price: f64,
    #[serde(default)]
    pub stock: Option<i64>,
    pub is_active: bool,
}

/// Customization patch offered for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPatch {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

/// Membership row of the product/league join table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLeagueLink {
    pub league_id: String,
}

/// Product row with its nested team, variants, patches and league links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    /// Manual position in the featured list, lowest first
    #[serde(default)]
    pub featured_order: Option<i32>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub team: Option<RawTeam>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub patches: Vec<RawPatch>,
    #[serde(default)]
    pub leagues: Vec<RawLeagueLink>,
}

/// Minimal row used to order the catalog before hydration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortRow {
    pub id: ProductId,
    pub name: String,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLeague {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBanner {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawShippingZone {
    pub id: String,
    pub department: String,
    pub municipality: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Filters shared by the sorted listing and the relevance ranking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Equality filter on the product's category
    pub category_id: Option<String>,
    /// Restrict to products linked to this league
    pub league_id: Option<String>,
}

/// Request for one page of relevance-ranked ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: String,
    pub filter: CatalogFilter,
    pub limit: usize,
    pub offset: usize,
}
