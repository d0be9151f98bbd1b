mod common;

use std::time::Duration;

use common::memory_store;
use courtline::cache::{CacheKey, ResponseCache};
use courtline::config::CacheConfig;

#[tokio::test]
async fn put_then_get_returns_payload_before_expiry() {
    let store = memory_store().await;
    let cache = ResponseCache::new(store, CacheConfig::default());

    let key = CacheKey::endpoint("/teams", &[]);
    assert_eq!(cache.get(&key).await, None);

    cache.put(&key, r#"{"data":[]}"#, Duration::from_secs(60)).await;
    assert_eq!(cache.get(&key).await.as_deref(), Some(r#"{"data":[]}"#));
}

#[tokio::test]
async fn expired_entries_are_misses() {
    let store = memory_store().await;
    let cache = ResponseCache::new(store, CacheConfig::default());

    let key = CacheKey::raw("short-lived");
    cache.put(&key, "payload", Duration::ZERO).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(cache.get(&key).await, None);
}

#[tokio::test]
async fn put_overwrites_existing_entry() {
    let store = memory_store().await;
    let cache = ResponseCache::new(store.clone(), CacheConfig::default());

    let key = CacheKey::endpoint(
        "/players",
        &[("search".to_string(), "james".to_string())],
    );
    cache.put(&key, "stale", Duration::from_secs(60)).await;
    cache.put(&key, "fresh", Duration::from_secs(60)).await;

    assert_eq!(cache.get(&key).await.as_deref(), Some("fresh"));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_cache")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn purge_removes_only_expired_entries() {
    let store = memory_store().await;
    let cache = ResponseCache::new(store, CacheConfig::default());

    cache.put(&CacheKey::raw("dead-1"), "x", Duration::ZERO).await;
    cache.put(&CacheKey::raw("dead-2"), "y", Duration::ZERO).await;
    let live = CacheKey::raw("live");
    cache.put(&live, "z", Duration::from_secs(3600)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(cache.purge_expired().await.unwrap(), 2);
    assert_eq!(cache.get(&live).await.as_deref(), Some("z"));
    // Idempotent once clean
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn ttl_policy_follows_endpoint_prefix() {
    let store = memory_store().await;
    let ttls = CacheConfig::default();
    let cache = ResponseCache::new(store, ttls.clone());

    assert_eq!(
        cache.ttl_for("/teams"),
        Duration::from_secs(ttls.team_info_secs)
    );
    assert_eq!(
        cache.ttl_for("/players?search=james"),
        Duration::from_secs(ttls.player_info_secs)
    );
    assert_eq!(
        cache.ttl_for("/stats"),
        Duration::from_secs(ttls.player_stats_secs)
    );
    assert_eq!(
        cache.ttl_for("/games/123"),
        Duration::from_secs(ttls.games_secs)
    );
    assert_eq!(
        cache.ttl_for("/season_averages"),
        Duration::from_secs(ttls.season_averages_secs)
    );
    // Anything unrecognized gets the short line TTL
    assert_eq!(
        cache.ttl_for("/odds"),
        Duration::from_secs(ttls.lines_secs)
    );
}

#[tokio::test]
async fn keys_distinguish_params() {
    let store = memory_store().await;
    let cache = ResponseCache::new(store, CacheConfig::default());

    let a = CacheKey::endpoint("/games", &[("seasons[]".to_string(), "2023".to_string())]);
    let b = CacheKey::endpoint("/games", &[("seasons[]".to_string(), "2024".to_string())]);
    cache.put(&a, "old season", Duration::from_secs(60)).await;

    assert_eq!(cache.get(&a).await.as_deref(), Some("old season"));
    assert_eq!(cache.get(&b).await, None);
}
