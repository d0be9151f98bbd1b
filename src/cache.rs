//! Expiring response cache backed by the `api_cache` table.
//!
//! Avoids redundant upstream fetches. Caching is a performance optimization
//! only: every failure path here degrades to a cache miss and the caller
//! fetches as if uncached.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::store::SqliteStore;

/// Cache key: either an endpoint plus its serialized query parameters, or a
/// free-form string (the scraper fallback keys its payloads directly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    Endpoint { endpoint: String, params: String },
    Raw(String),
}

impl CacheKey {
    /// Build an endpoint key. Parameters are serialized in the order the
    /// caller supplies them, so identical requests produce identical keys.
    pub fn endpoint(endpoint: &str, params: &[(String, String)]) -> Self {
        let params = serde_json::to_string(params).unwrap_or_default();
        CacheKey::Endpoint {
            endpoint: endpoint.to_string(),
            params,
        }
    }

    pub fn raw(key: impl Into<String>) -> Self {
        CacheKey::Raw(key.into())
    }

    fn as_storage_key(&self) -> String {
        match self {
            CacheKey::Endpoint { endpoint, params } => format!("{endpoint}?{params}"),
            CacheKey::Raw(key) => key.clone(),
        }
    }
}

/// Store-backed cache with a per-endpoint TTL policy
#[derive(Clone)]
pub struct ResponseCache {
    store: SqliteStore,
    ttls: CacheConfig,
}

impl ResponseCache {
    pub fn new(store: SqliteStore, ttls: CacheConfig) -> Self {
        Self { store, ttls }
    }

    /// TTL for a given endpoint. Team data barely changes; box scores and
    /// line lookups go stale quickly.
    pub fn ttl_for(&self, endpoint: &str) -> Duration {
        let secs = if endpoint.starts_with("/teams") {
            self.ttls.team_info_secs
        } else if endpoint.starts_with("/players") {
            self.ttls.player_info_secs
        } else if endpoint.starts_with("/stats") {
            self.ttls.player_stats_secs
        } else if endpoint.starts_with("/games") {
            self.ttls.games_secs
        } else if endpoint.starts_with("/season_averages") {
            self.ttls.season_averages_secs
        } else {
            self.ttls.lines_secs
        };
        Duration::from_secs(secs)
    }

    /// Fetch an unexpired payload for the exact key, or None
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self
            .store
            .cache_get(&key.as_storage_key(), Utc::now())
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Insert or overwrite the entry with expiry = now + ttl
    pub async fn put(&self, key: &CacheKey, payload: &str, ttl: Duration) {
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default();
        if let Err(e) = self
            .store
            .cache_put(&key.as_storage_key(), payload, expires_at)
            .await
        {
            warn!(error = %e, "Cache write failed, response not cached");
        }
    }

    /// Delete every expired entry. Intended as a periodic maintenance sweep,
    /// not a read-path concern.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = self.store.cache_purge_expired(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "Purged expired cache entries");
        }
        Ok(purged)
    }
}
