//! REST backend for the remote catalog store
//!
//! Talks to a PostgREST-style API: tables under `rest/v1/<table>` with
//! embedded selects and `eq`/`in` filters, and the relevance ranking exposed
//! as the `rpc/search_products` function.

use crate::cache::config::env_parse;
use crate::error::{CatalogError, Result};
use crate::remote::types::{
    CatalogFilter, ProductId, RawBanner, RawCategory, RawLeague, RawProduct, RawShippingZone,
    SearchRequest, SortRow,
};
use crate::remote::RemoteStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Columns needed to hydrate a product with everything the storefront shows
const PRODUCT_SELECT: &str = "id,name,image_url,is_active,is_featured,featured_order,team_id,category_id,\
team:teams(id,name,logo_url),\
variants:product_variants(id,size,price,stock,is_active),\
patches:product_patches(id,name,price,is_active),\
leagues:product_leagues(league_id)";

const RANKING_FUNCTION: &str = "search_products";

/// Connection settings for [`RestStore`]
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://example.supabase.co`
    pub base_url: String,
    /// Anonymous API key sent as `apikey` and bearer token
    pub api_key: String,
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
    /// Response time above which a health check reports degraded (in milliseconds)
    pub degraded_threshold_ms: u64,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            degraded_threshold_ms: 1000,
        }
    }

    /// Load settings from the environment (and a `.env` file if present).
    ///
    /// Requires `CATALOG_API_URL` and `CATALOG_API_KEY`; honours
    /// `CATALOG_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let base_url = std::env::var("CATALOG_API_URL")
            .map_err(|_| CatalogError::Config("CATALOG_API_URL is not set".to_string()))?;
        let api_key = std::env::var("CATALOG_API_KEY")
            .map_err(|_| CatalogError::Config("CATALOG_API_KEY is not set".to_string()))?;

        let mut config = Self::new(base_url, api_key);
        if let Some(secs) = env_parse::<u64>("CATALOG_API_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// Health status of the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Responsive within the degraded threshold
    Healthy,
    /// Responsive but slow
    Degraded,
    /// Not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy or degraded (operational)
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl HealthCheckResult {
    fn responded(response_time: Duration, degraded_threshold_ms: u64) -> Self {
        let response_time_ms = response_time.as_millis() as u64;
        let status = if response_time_ms > degraded_threshold_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            response_time_ms,
            timestamp: Utc::now(),
            error: None,
        }
    }

    fn failed(response_time: Duration, error: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: response_time.as_millis() as u64,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

/// Sort row as selected over the wire: team name arrives embedded
#[derive(Debug, Deserialize)]
struct WireSortRow {
    id: ProductId,
    name: String,
    #[serde(default)]
    team: Option<WireTeamName>,
}

#[derive(Debug, Deserialize)]
struct WireTeamName {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRankedId {
    id: ProductId,
}

#[derive(Debug, Serialize)]
struct RankingArgs<'a> {
    search_term: &'a str,
    category_filter: Option<&'a str>,
    league_filter: Option<&'a str>,
    result_limit: usize,
    result_offset: usize,
}

/// [`RemoteStore`] over HTTP
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    config: RestStoreConfig,
}

impl RestStore {
    /// Create a store client. No request is made until the first query.
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .and_then(|url| url.join("rest/v1/"))
            .map_err(|e| CatalogError::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(CatalogError::Config(format!(
                "unsupported URL scheme: {}",
                base.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("jersey-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        info!("Configured remote catalog store at {}", base);

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Probe the API root and classify the response time
    pub async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let outcome = self
            .client
            .get(self.base.clone())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match outcome {
            Ok(resp) if resp.status().is_success() => {
                let elapsed = start.elapsed();
                debug!("Health check passed ({}ms)", elapsed.as_millis());
                HealthCheckResult::responded(elapsed, self.config.degraded_threshold_ms)
            }
            Ok(resp) => {
                let status = resp.status();
                error!("Health check returned status {}", status);
                HealthCheckResult::failed(start.elapsed(), &format!("status {}", status))
            }
            Err(e) => {
                error!("Health check failed: {}", e);
                HealthCheckResult::failed(start.elapsed(), &e.to_string())
            }
        }
    }

    fn table_url(&self, table: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(table)
            .map_err(|e| CatalogError::Config(e.to_string()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: Vec<(String, String)>) -> Result<T> {
        let url = self.table_url(table, &query)?;
        debug!("Querying {}", url);

        let resp = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        Self::handle(resp).await
    }

    async fn rpc<B: Serialize, T: DeserializeOwned>(&self, function: &str, body: &B) -> Result<T> {
        let url = self.table_url(&format!("rpc/{}", function), &[])?;
        debug!("Calling {}", url);

        let resp = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        Self::handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(CatalogError::Query {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn pair(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

fn products_query() -> Vec<(String, String)> {
    vec![pair("select", PRODUCT_SELECT), pair("is_active", "eq.true")]
}

fn sort_rows_query(filter: &CatalogFilter) -> Vec<(String, String)> {
    let mut select = "id,name,team:teams(name)".to_string();
    if filter.league_id.is_some() {
        select.push_str(",leagues:product_leagues!inner(league_id)");
    }

    let mut query = vec![pair("select", select), pair("is_active", "eq.true")];
    if let Some(category_id) = &filter.category_id {
        query.push(pair("category_id", format!("eq.{}", category_id)));
    }
    if let Some(league_id) = &filter.league_id {
        query.push(pair("leagues.league_id", format!("eq.{}", league_id)));
    }
    query
}

fn by_ids_query(ids: &[ProductId]) -> Vec<(String, String)> {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    vec![
        pair("select", PRODUCT_SELECT),
        pair("is_active", "eq.true"),
        pair("id", format!("in.({})", quoted.join(","))),
    ]
}

fn featured_query() -> Vec<(String, String)> {
    vec![
        pair("select", PRODUCT_SELECT),
        pair("is_active", "eq.true"),
        pair("is_featured", "eq.true"),
        pair("order", "featured_order.asc.nullslast"),
    ]
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn products(&self) -> Result<Vec<RawProduct>> {
        self.select("products", products_query()).await
    }

    async fn product_sort_rows(&self, filter: &CatalogFilter) -> Result<Vec<SortRow>> {
        let rows: Vec<WireSortRow> = self.select("products", sort_rows_query(filter)).await?;
        Ok(rows
            .into_iter()
            .map(|row| SortRow {
                id: row.id,
                name: row.name,
                team_name: row.team.and_then(|t| t.name),
            })
            .collect())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<RawProduct>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select("products", by_ids_query(ids)).await
    }

    async fn featured_products(&self) -> Result<Vec<RawProduct>> {
        self.select("products", featured_query()).await
    }

    async fn categories(&self) -> Result<Vec<RawCategory>> {
        self.select(
            "categories",
            vec![pair("select", "id,name,slug,is_active"), pair("order", "name.asc")],
        )
        .await
    }

    async fn leagues(&self) -> Result<Vec<RawLeague>> {
        self.select(
            "leagues",
            vec![pair("select", "id,name,logo_url,is_active"), pair("order", "name.asc")],
        )
        .await
    }

    async fn banners(&self) -> Result<Vec<RawBanner>> {
        self.select(
            "banners",
            vec![
                pair("select", "id,title,image_url,link_url,position,is_active"),
                pair("is_active", "eq.true"),
                pair("order", "position.asc.nullslast"),
            ],
        )
        .await
    }

    async fn shipping_zones(&self) -> Result<Vec<RawShippingZone>> {
        self.select(
            "shipping_zones",
            vec![
                pair("select", "id,department,municipality,latitude,longitude"),
                pair("order", "department.asc,municipality.asc"),
            ],
        )
        .await
    }

    async fn rank_products(&self, request: &SearchRequest) -> Result<Vec<ProductId>> {
        let args = RankingArgs {
            search_term: &request.term,
            category_filter: request.filter.category_id.as_deref(),
            league_filter: request.filter.league_id.as_deref(),
            result_limit: request.limit,
            result_offset: request.offset,
        };
        let rows: Vec<WireRankedId> = self.rpc(RANKING_FUNCTION, &args).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_sort_rows_query_without_filters() {
        let query = sort_rows_query(&CatalogFilter::default());

        assert_eq!(lookup(&query, "select"), Some("id,name,team:teams(name)"));
        assert_eq!(lookup(&query, "is_active"), Some("eq.true"));
        assert!(lookup(&query, "category_id").is_none());
        assert!(lookup(&query, "leagues.league_id").is_none());
    }

    #[test]
    fn test_sort_rows_query_with_league_uses_inner_join() {
        let filter = CatalogFilter {
            category_id: Some("C1".to_string()),
            league_id: Some("L9".to_string()),
        };
        let query = sort_rows_query(&filter);

        assert!(lookup(&query, "select").unwrap().contains("product_leagues!inner(league_id)"));
        assert_eq!(lookup(&query, "category_id"), Some("eq.C1"));
        assert_eq!(lookup(&query, "leagues.league_id"), Some("eq.L9"));
    }

    #[test]
    fn test_by_ids_query_quotes_values() {
        let query = by_ids_query(&["a".to_string(), "b\"c".to_string()]);
        assert_eq!(lookup(&query, "id"), Some(r#"in.("a","b\"c")"#));
    }

    #[test]
    fn test_featured_query_orders_by_rank() {
        let query = featured_query();
        assert_eq!(lookup(&query, "is_featured"), Some("eq.true"));
        assert_eq!(lookup(&query, "order"), Some("featured_order.asc.nullslast"));
    }

    #[test]
    fn test_store_rejects_bad_urls() {
        let err = RestStore::new(RestStoreConfig::new("not a url", "key")).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));

        let err = RestStore::new(RestStoreConfig::new("ftp://example.com", "key")).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_table_url_encodes_query() {
        let store = RestStore::new(RestStoreConfig::new("https://example.com", "key")).unwrap();
        let url = store
            .table_url("products", &[pair("id", "in.(\"a\",\"b\")")])
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/products");
        let (_, value) = url.query_pairs().next().unwrap();
        assert_eq!(value, "in.(\"a\",\"b\")");
    }

    #[test]
    fn test_health_status_classification() {
        let healthy = HealthCheckResult::responded(Duration::from_millis(50), 1000);
        assert_eq!(healthy.status, HealthStatus::Healthy);

        let degraded = HealthCheckResult::responded(Duration::from_millis(1500), 1000);
        assert_eq!(degraded.status, HealthStatus::Degraded);
        assert!(degraded.status.is_operational());

        let failed = HealthCheckResult::failed(Duration::from_millis(5), "connection refused");
        assert!(!failed.status.is_operational());
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_a_transport_error() {
        let mut config = RestStoreConfig::new("http://127.0.0.1:9", "key");
        config.timeout = Duration::from_secs(2);
        let store = RestStore::new(config).unwrap();

        let err = store.products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
    }
}
