//! Cache key construction
//!
//! Keys have the shape `<family>:<resource>[?param=value&...]`. The family
//! segment is what invalidation matches on.

use crate::cache::invalidation::CacheFamily;
use crate::cache::types::CacheKey;
use std::fmt;

/// Cached catalog resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Full, unpaginated product list
    Products,
    /// One memoized page of the paginated catalog
    ProductPage,
    /// Featured products
    Featured,
    /// Storefront banners
    Banners,
    /// Categories and leagues
    Taxonomy,
    /// Shipping zones
    ShippingZones,
}

impl Resource {
    /// The invalidation family this resource belongs to
    pub fn family(&self) -> CacheFamily {
        match self {
            Resource::Products | Resource::ProductPage | Resource::Featured | Resource::Banners => {
                CacheFamily::Catalog
            }
            Resource::Taxonomy | Resource::ShippingZones => CacheFamily::Configuration,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::ProductPage => "page",
            Resource::Featured => "featured",
            Resource::Banners => "banners",
            Resource::Taxonomy => "taxonomy",
            Resource::ShippingZones => "shipping_zones",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family(), self.as_str())
    }
}

/// Cache key builder
pub struct CacheKeyBuilder {
    resource: Resource,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a parameter only when a value is present
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = self.resource.to_string();

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push('?');
            key.push_str(&params_str.join("&"));
        }

        key
    }
}

/// Key for a resource with no parameters
pub fn key_for(resource: Resource) -> CacheKey {
    CacheKeyBuilder::new(resource).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::Products.to_string(), "catalog:products");
        assert_eq!(Resource::Featured.to_string(), "catalog:featured");
        assert_eq!(Resource::Taxonomy.to_string(), "configuration:taxonomy");
        assert_eq!(
            Resource::ShippingZones.to_string(),
            "configuration:shipping_zones"
        );
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(key_for(Resource::Banners), "catalog:banners");

        let key = CacheKeyBuilder::new(Resource::ProductPage)
            .param("page", "2")
            .param("limit", "24")
            .param_opt("category", Some("C1"))
            .param_opt("league", None::<String>)
            .build();
        assert_eq!(key, "catalog:page?page=2&limit=24&category=C1");
    }

    #[test]
    fn test_resource_families() {
        assert_eq!(Resource::Banners.family(), CacheFamily::Catalog);
        assert_eq!(Resource::ProductPage.family(), CacheFamily::Catalog);
        assert_eq!(Resource::ShippingZones.family(), CacheFamily::Configuration);
    }
}
