//! Rate-limited client for the BallDontLie NBA API.
//!
//! The All-Star tier allows 60 requests per minute; the client sleeps between
//! requests to stay inside the budget. Cursor-based pagination is flattened
//! into a single ordered collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::types::{
    ApiGame, ApiPlayer, ApiSeasonAverage, ApiStatLine, ApiTeam, Page, Single,
};
use super::{GameFilter, PlayerFilter, SportsDataSource, StatFilter};
use crate::cache::{CacheKey, ResponseCache};
use crate::config::ProviderConfig;
use crate::error::{CourtlineError, Result};

/// HTTP client for the upstream stats API with built-in throttling,
/// pagination, and an optional read-through response cache.
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    /// Send time of the previous request; one shared throttle per client
    last_request: Mutex<Option<Instant>>,
    cache: Option<ResponseCache>,
}

impl ProviderClient {
    pub fn new(cfg: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&cfg.api_key)
            .map_err(|e| CourtlineError::Internal(format!("invalid api key: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        info!(
            rate_limit = cfg.rate_limit_per_minute,
            "Initialized provider client"
        );

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            min_interval: cfg.min_request_interval(),
            last_request: Mutex::new(None),
            cache: None,
        })
    }

    /// Attach a read-through response cache. Cache failures degrade to
    /// misses; caching never affects correctness.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sleep until at least `min_interval` has elapsed since the previous
    /// request's send time. The lock is held across the sleep so concurrent
    /// callers on the same client serialize behind one throttle.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Issue one throttled GET and return the raw body. Non-2xx statuses
    /// abort with `UpstreamStatus`; callers never see partial results.
    async fn get_raw(&self, endpoint: &str, params: &[(String, String)]) -> Result<String> {
        self.throttle().await;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, ?params, "GET");

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CourtlineError::UpstreamStatus {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch one resource, consulting the cache first when one is attached
    async fn get_cached(&self, endpoint: &str, params: &[(String, String)]) -> Result<String> {
        if let Some(cache) = &self.cache {
            let key = CacheKey::endpoint(endpoint, params);
            if let Some(hit) = cache.get(&key).await {
                debug!(%endpoint, "Cache hit");
                return Ok(hit);
            }
            let body = self.get_raw(endpoint, params).await?;
            cache.put(&key, &body, cache.ttl_for(endpoint)).await;
            Ok(body)
        } else {
            self.get_raw(endpoint, params).await
        }
    }

    /// Fetch a single page of a paginated endpoint
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Page<T>> {
        let body = self.get_cached(endpoint, params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a single (non-paginated) resource
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let body = self.get_cached(endpoint, params).await?;
        let single: Single<T> = serde_json::from_str(&body)?;
        Ok(single.data)
    }

    /// Walk a cursor-paginated endpoint, accumulating all items in page
    /// order. Stops when the upstream omits the cursor or `max_pages` is
    /// reached.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        max_pages: Option<u32>,
    ) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page_count = 0u32;
        let mut cursor: Option<String> = None;

        loop {
            let mut page_params = params.to_vec();
            if let Some(c) = &cursor {
                page_params.push(("cursor".to_string(), c.clone()));
            }

            let page: Page<T> = self.fetch_page(endpoint, &page_params).await?;
            let fetched = page.data.len();
            all_items.extend(page.data);
            page_count += 1;
            debug!(
                %endpoint,
                page = page_count,
                items = fetched,
                total = all_items.len(),
                "Fetched page"
            );

            cursor = page.meta.as_ref().and_then(|m| render_cursor(m.next_cursor.as_ref()));
            if cursor.is_none() {
                info!(%endpoint, total = all_items.len(), "Pagination complete");
                break;
            }
            if let Some(max) = max_pages {
                if page_count >= max {
                    info!(%endpoint, max_pages = max, "Reached max_pages limit");
                    break;
                }
            }
        }

        Ok(all_items)
    }

    /// Fetch a single game by its provider id
    pub async fn game(&self, api_id: i64) -> Result<ApiGame> {
        self.fetch_one(&format!("/games/{api_id}"), &[]).await
    }

    /// Fetch provider-computed season averages for a season, optionally
    /// restricted to specific players. Single fetch, not paginated.
    pub async fn season_averages(
        &self,
        season: i32,
        player_ids: &[i64],
    ) -> Result<Vec<ApiSeasonAverage>> {
        let mut params = vec![("season".to_string(), season.to_string())];
        for id in player_ids {
            params.push(("player_ids[]".to_string(), id.to_string()));
        }
        let page: Page<ApiSeasonAverage> = self.fetch_page("/season_averages", &params).await?;
        Ok(page.data)
    }
}

/// Render an opaque cursor value as a query parameter
fn render_cursor(cursor: Option<&serde_json::Value>) -> Option<String> {
    match cursor? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl SportsDataSource for ProviderClient {
    async fn teams(&self) -> Result<Vec<ApiTeam>> {
        info!("Fetching all teams");
        self.paginate("/teams", &[], None).await
    }

    async fn players(&self, filter: &PlayerFilter) -> Result<Vec<ApiPlayer>> {
        info!(?filter, "Fetching players");
        self.paginate("/players", &filter.to_params(), None).await
    }

    async fn games(&self, filter: &GameFilter) -> Result<Vec<ApiGame>> {
        info!(?filter, "Fetching games");
        self.paginate("/games", &filter.to_params(), None).await
    }

    async fn stats(&self, filter: &StatFilter) -> Result<Vec<ApiStatLine>> {
        info!(?filter, "Fetching stats");
        self.paginate("/stats", &filter.to_params(), None).await
    }
}
