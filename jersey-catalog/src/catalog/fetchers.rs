//! Resource fetchers and row adapters
//!
//! One fetcher per cached resource. Each issues its query against the remote
//! store and maps raw rows into the catalog model. Errors propagate untouched.

use crate::catalog::types::{
    Banner, CatalogTaxonomy, Category, Coordinates, League, Patch, Product, ShippingZone, Variant,
};
use crate::error::Result;
use crate::remote::types::{
    ProductId, RawBanner, RawCategory, RawLeague, RawProduct, RawShippingZone, RawVariant,
};
use crate::remote::RemoteStore;
use tracing::debug;

/// Minimum price over active variants; 0 when no variant is active
pub fn base_price(variants: &[RawVariant]) -> f64 {
    variants
        .iter()
        .filter(|v| v.is_active)
        .map(|v| v.price)
        .fold(None, |min: Option<f64>, price| match min {
            Some(current) if current <= price => Some(current),
            _ => Some(price),
        })
        .unwrap_or(0.0)
}

pub fn adapt_product(raw: RawProduct) -> Product {
    let base_price = base_price(&raw.variants);
    let (team_name, team_logo_url) = match raw.team {
        Some(team) => (team.name, team.logo_url),
        None => (None, None),
    };

    let variants = raw
        .variants
        .into_iter()
        .filter(|v| v.is_active)
        .map(|v| Variant {
            id: v.id,
            size: v.size,
            price: v.price,
            stock: v.stock,
        })
        .collect();

    let patches = raw
        .patches
        .into_iter()
        .filter(|p| p.is_active)
        .map(|p| Patch {
            id: p.id,
            name: p.name,
            price: p.price,
        })
        .collect();

    Product {
        id: raw.id,
        name: raw.name,
        team_name,
        team_logo_url,
        base_price,
        image_url: raw.image_url,
        is_featured: raw.is_featured,
        featured_order: raw.featured_order,
        team_id: raw.team_id,
        category_id: raw.category_id,
        league_ids: raw.leagues.into_iter().map(|l| l.league_id).collect(),
        variants,
        patches,
    }
}

pub fn adapt_taxonomy(categories: Vec<RawCategory>, leagues: Vec<RawLeague>) -> CatalogTaxonomy {
    CatalogTaxonomy {
        categories: categories
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| Category {
                id: c.id,
                name: c.name,
                slug: c.slug,
            })
            .collect(),
        leagues: leagues
            .into_iter()
            .filter(|l| l.is_active)
            .map(|l| League {
                id: l.id,
                name: l.name,
                logo_url: l.logo_url,
            })
            .collect(),
    }
}

pub fn adapt_banner(raw: RawBanner) -> Banner {
    Banner {
        id: raw.id,
        title: raw.title,
        image_url: raw.image_url,
        link_url: raw.link_url,
        position: raw.position,
    }
}

/// Coordinates are kept only when both halves are present
pub fn adapt_shipping_zone(raw: RawShippingZone) -> ShippingZone {
    let coordinates = match (raw.latitude, raw.longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    ShippingZone {
        id: raw.id,
        department: raw.department,
        municipality: raw.municipality,
        coordinates,
    }
}

/// Sort by an optional rank, unranked last, keeping input order on ties
fn sort_by_rank<T>(items: &mut [T], rank: impl Fn(&T) -> Option<i32>) {
    items.sort_by_key(|item| match rank(item) {
        Some(r) => (0, r),
        None => (1, 0),
    });
}

/// Every active product, ordered by team then name
pub async fn fetch_products(store: &dyn RemoteStore) -> Result<Vec<Product>> {
    let rows = store.products().await?;
    debug!("Fetched {} products", rows.len());

    let mut keyed: Vec<_> = rows
        .into_iter()
        .filter(|raw| raw.is_active)
        .map(adapt_product)
        .map(|product| (product.sort_key(), product))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(keyed.into_iter().map(|(_, product)| product).collect())
}

/// Featured products in manual rank order
pub async fn fetch_featured(store: &dyn RemoteStore) -> Result<Vec<Product>> {
    let rows = store.featured_products().await?;
    debug!("Fetched {} featured products", rows.len());

    let mut products: Vec<Product> = rows
        .into_iter()
        .filter(|raw| raw.is_active && raw.is_featured)
        .map(adapt_product)
        .collect();
    sort_by_rank(&mut products, |p| p.featured_order);
    Ok(products)
}

/// Categories and leagues, fetched concurrently
pub async fn fetch_taxonomy(store: &dyn RemoteStore) -> Result<CatalogTaxonomy> {
    let (categories, leagues) = tokio::try_join!(store.categories(), store.leagues())?;
    debug!(
        "Fetched {} categories and {} leagues",
        categories.len(),
        leagues.len()
    );
    Ok(adapt_taxonomy(categories, leagues))
}

/// Active banners by position
pub async fn fetch_banners(store: &dyn RemoteStore) -> Result<Vec<Banner>> {
    let mut banners: Vec<Banner> = store
        .banners()
        .await?
        .into_iter()
        .filter(|b| b.is_active)
        .map(adapt_banner)
        .collect();
    sort_by_rank(&mut banners, |b| b.position);
    Ok(banners)
}

pub async fn fetch_shipping_zones(store: &dyn RemoteStore) -> Result<Vec<ShippingZone>> {
    let zones = store.shipping_zones().await?;
    debug!("Fetched {} shipping zones", zones.len());
    Ok(zones.into_iter().map(adapt_shipping_zone).collect())
}

/// Full detail for `ids`, in whatever order the store returns.
///
/// Inactive rows are dropped.
pub async fn hydrate(store: &dyn RemoteStore, ids: &[ProductId]) -> Result<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store.products_by_ids(ids).await?;
    debug!("Hydrated {} of {} products", rows.len(), ids.len());

    Ok(rows
        .into_iter()
        .filter(|raw| raw.is_active)
        .map(adapt_product)
        .collect())
}
