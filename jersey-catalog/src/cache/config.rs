//! Configuration for the cache system

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tiered catalog cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which an entry is stale and eligible for background refresh.
    /// Stale entries are still served from the persisted tier.
    pub freshness_window: Duration,

    /// Lifetime of a memoized catalog page
    pub page_ttl: Duration,

    /// Maximum number of memoized pages before the oldest is evicted
    pub page_capacity: usize,

    /// Prefix applied to every key written to the persisted tier, so a shared
    /// session store can host other data without collisions
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 10 minutes
            freshness_window: Duration::from_secs(600),
            // 1 minute
            page_ttl: Duration::from_secs(60),
            page_capacity: 50,
            namespace: "jersey-catalog".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.freshness_window.is_zero() {
            return Err(CatalogError::Config(
                "freshness_window must be greater than 0".to_string(),
            ));
        }

        if self.page_capacity == 0 {
            return Err(CatalogError::Config(
                "page_capacity must be greater than 0".to_string(),
            ));
        }

        if self.namespace.trim().is_empty() || self.namespace.contains(':') {
            return Err(CatalogError::Config(
                "namespace must be non-empty and must not contain ':'".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Reads `CATALOG_CACHE_FRESHNESS_SECS`, `CATALOG_CACHE_PAGE_TTL_SECS`,
    /// `CATALOG_CACHE_PAGE_CAPACITY` and `CATALOG_CACHE_NAMESPACE`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = Self::builder();
        if let Some(secs) = env_parse::<u64>("CATALOG_CACHE_FRESHNESS_SECS")? {
            builder = builder.freshness_window(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("CATALOG_CACHE_PAGE_TTL_SECS")? {
            builder = builder.page_ttl(Duration::from_secs(secs));
        }
        if let Some(capacity) = env_parse::<usize>("CATALOG_CACHE_PAGE_CAPACITY")? {
            builder = builder.page_capacity(capacity);
        }
        if let Ok(namespace) = std::env::var("CATALOG_CACHE_NAMESPACE") {
            builder = builder.namespace(namespace);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

pub(crate) fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CatalogError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    freshness_window: Option<Duration>,
    page_ttl: Option<Duration>,
    page_capacity: Option<usize>,
    namespace: Option<String>,
}

impl CacheConfigBuilder {
    /// Set the freshness window
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = Some(window);
        self
    }

    /// Set the page memo lifetime
    pub fn page_ttl(mut self, ttl: Duration) -> Self {
        self.page_ttl = Some(ttl);
        self
    }

    /// Set the page memo capacity
    pub fn page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = Some(capacity);
        self
    }

    /// Set the persisted key namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            freshness_window: self.freshness_window.unwrap_or(defaults.freshness_window),
            page_ttl: self.page_ttl.unwrap_or(defaults.page_ttl),
            page_capacity: self.page_capacity.unwrap_or(defaults.page_capacity),
            namespace: self.namespace.unwrap_or(defaults.namespace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.freshness_window, Duration::from_secs(600));
        assert_eq!(config.page_ttl, Duration::from_secs(60));
        assert_eq!(config.page_capacity, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid_config = CacheConfig::default();
        invalid_config.page_capacity = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.freshness_window = Duration::ZERO;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.namespace = "a:b".to_string();
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .freshness_window(Duration::from_secs(30))
            .page_capacity(5)
            .namespace("tests")
            .build();

        assert_eq!(config.freshness_window, Duration::from_secs(30));
        assert_eq!(config.page_capacity, 5);
        assert_eq!(config.namespace, "tests");
        // Unset fields keep their defaults
        assert_eq!(config.page_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("CATALOG_TEST_ENV_PARSE", "not-a-number");
        let parsed = env_parse::<u64>("CATALOG_TEST_ENV_PARSE");
        assert!(matches!(parsed, Err(CatalogError::Config(_))));

        std::env::set_var("CATALOG_TEST_ENV_PARSE", " 42 ");
        assert_eq!(env_parse::<u64>("CATALOG_TEST_ENV_PARSE").unwrap(), Some(42));
        std::env::remove_var("CATALOG_TEST_ENV_PARSE");

        assert_eq!(env_parse::<u64>("CATALOG_TEST_ENV_MISSING").unwrap(), None);
    }
}
