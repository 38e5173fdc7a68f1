//! Integration Tests for the Cached Client
//!
//! Runs the full fetch path against a local mock HTTP server: coalescing,
//! cache hits and TTL expiry, non-GET bypass, error taxonomy, invalidation,
//! and batching.

use std::time::Duration;

use fetch_cache::{BatchRequest, Config, FetchCache, FetchError, FetchOptions, FetchResult};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Config with a short sweep interval suited to tests.
fn test_config() -> Config {
    Config {
        max_entries: 50,
        default_ttl: Duration::from_millis(300_000),
        sweep_interval: Duration::from_millis(100),
        pending_max_age: Duration::from_secs(30),
        request_timeout: Duration::from_secs(5),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct User {
    id: u32,
    name: String,
}

// == Coalescing Tests ==

#[tokio::test]
async fn test_concurrent_identical_gets_issue_one_request() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/1", server.url());

    // Both futures are polled before either response lands, so the second
    // caller joins the first caller's in-flight request.
    let (a, b) = tokio::join!(
        cache.fetch::<User>(&url, FetchOptions::get()),
        cache.fetch::<User>(&url, FetchOptions::get()),
    );

    let a = a?;
    let b = b?;
    assert_eq!(a.data, b.data);
    assert!(!a.from_cache);
    assert!(!b.from_cache);

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_failure_is_shared_by_all_callers() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/broken")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/broken", server.url());

    let (a, b) = tokio::join!(
        cache.fetch::<Value>(&url, FetchOptions::get()),
        cache.fetch::<Value>(&url, FetchOptions::get()),
    );

    let err_a = a.unwrap_err();
    let err_b = b.unwrap_err();
    assert_eq!(err_a, err_b);
    assert_eq!(err_a.status(), Some(503));

    mock.assert_async().await;
    Ok(())
}

// == Cache Hit and TTL Tests ==

#[tokio::test]
async fn test_second_read_is_served_from_cache() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/1", server.url());

    let first: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;
    let second: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.data, second.data);

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_expired_entry_triggers_refetch() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(2)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/1", server.url());
    let options = FetchOptions::get().with_ttl(Duration::from_millis(80));

    let first: FetchResult<User> = cache.fetch(&url, options.clone()).await?;
    assert!(!first.from_cache);

    tokio::time::sleep(Duration::from_millis(120)).await;

    let second: FetchResult<User> = cache.fetch(&url, options).await?;
    assert!(!second.from_cache);

    mock.assert_async().await;
    Ok(())
}

// == Non-GET Bypass Tests ==

#[tokio::test]
async fn test_repeated_posts_each_hit_the_network() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/users")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7, "name": "new"}"#)
        .expect(2)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users", server.url());
    let options = FetchOptions::post(json!({"name": "new"}));

    let first: FetchResult<User> = cache.fetch(&url, options.clone()).await?;
    let second: FetchResult<User> = cache.fetch(&url, options).await?;

    assert!(!first.from_cache);
    assert!(!second.from_cache);
    // Nothing was stored along the way.
    assert!(cache.is_empty().await);

    mock.assert_async().await;
    Ok(())
}

// == Error Taxonomy Tests ==

#[tokio::test]
async fn test_http_error_carries_status_and_is_not_cached() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let missing = server
        .mock("GET", "/api/users/404")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/404", server.url());

    let err = cache
        .fetch::<Value>(&url, FetchOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(cache.is_empty().await);
    missing.assert_async().await;

    // The endpoint recovers; the earlier failure must not poison the key.
    let recovered = server
        .mock("GET", "/api/users/404")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 404, "name": "found"}"#)
        .expect(1)
        .create_async()
        .await;

    let result: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;
    assert_eq!(result.data.name, "found");
    recovered.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_invalid_json_is_a_serialization_error() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/garbled")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json at all")
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/garbled", server.url());

    let err = cache
        .fetch::<Value>(&url, FetchOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Serialization { .. }));
}

#[tokio::test]
async fn test_unreachable_host_is_a_network_error() {
    init_tracing();
    let cache = FetchCache::new(test_config());

    // Port 9 is unassigned on loopback, so the connection is refused.
    let err = cache
        .fetch::<Value>("http://127.0.0.1:9/api/users", FetchOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));
}

// == Invalidation Tests ==

#[tokio::test]
async fn test_clear_matching_busts_only_matching_keys() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let users = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(2)
        .create_async()
        .await;
    let locations = server
        .mock("GET", "/api/locations/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 9, "name": "lab"}"#)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let users_url = format!("{}/api/users/1", server.url());
    let locations_url = format!("{}/api/locations/1", server.url());

    let _: FetchResult<User> = cache.fetch(&users_url, FetchOptions::get()).await?;
    let _: FetchResult<User> = cache.fetch(&locations_url, FetchOptions::get()).await?;

    let pattern = Regex::new(r"^GET:.*?/api/users").unwrap();
    assert_eq!(cache.clear_matching(&pattern).await, 1);

    // Users refetches; locations is still served from the cache.
    let refetched: FetchResult<User> = cache.fetch(&users_url, FetchOptions::get()).await?;
    assert!(!refetched.from_cache);
    let cached: FetchResult<User> = cache.fetch(&locations_url, FetchOptions::get()).await?;
    assert!(cached.from_cache);

    users.assert_async().await;
    locations.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_clear_all_busts_every_key() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(2)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/1", server.url());

    let _: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;
    cache.clear_all().await;
    assert!(cache.is_empty().await);

    let refetched: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;
    assert!(!refetched.from_cache);

    mock.assert_async().await;
    Ok(())
}

// == Batch Tests ==

#[tokio::test]
async fn test_batch_coalesces_duplicates_and_preserves_order() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let one = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .expect(1)
        .create_async()
        .await;
    let two = server
        .mock("GET", "/api/users/2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 2, "name": "grace"}"#)
        .expect(1)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url_one = format!("{}/api/users/1", server.url());
    let url_two = format!("{}/api/users/2", server.url());

    // The duplicate element joins the first element's in-flight request.
    let results: Vec<_> = cache
        .batch_fetch::<User>(vec![
            BatchRequest::new(&url_one),
            BatchRequest::new(&url_two),
            BatchRequest::new(&url_one),
        ])
        .await;

    assert_eq!(results.len(), 3);
    let first = results[0].as_ref().unwrap();
    let second = results[1].as_ref().unwrap();
    let third = results[2].as_ref().unwrap();
    assert_eq!(first.data.id, 1);
    assert_eq!(second.data.id, 2);
    assert_eq!(third.data.id, 1);
    assert_eq!(first.data, third.data);

    one.assert_async().await;
    two.assert_async().await;
    Ok(())
}

// == Cleanup Task Tests ==

#[tokio::test]
async fn test_cleanup_task_sweeps_expired_entries() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/users/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "ada"}"#)
        .create_async()
        .await;

    let cache = FetchCache::new(test_config());
    let url = format!("{}/api/users/1", server.url());

    let _: FetchResult<User> = cache
        .fetch(&url, FetchOptions::get().with_ttl(Duration::from_millis(50)))
        .await?;
    assert_eq!(cache.len().await, 1);

    let janitor = cache.spawn_cleanup_task();
    // One sweep interval after expiry, the entry is gone without any read.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(cache.is_empty().await);

    janitor.abort();
    Ok(())
}

// == End-To-End Scenario ==

#[tokio::test]
async fn test_two_readers_then_expiry_scenario() -> anyhow::Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/locations/abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 42, "name": "abc"}"#)
        .expect(2)
        .create_async()
        .await;

    let config = Config {
        // Short default TTL standing in for the production five minutes.
        default_ttl: Duration::from_millis(100),
        ..test_config()
    };
    let cache = FetchCache::new(config);
    let url = format!("{}/api/locations/abc", server.url());

    // Two components ask for the same resource in the same tick: one fetch.
    let (a, b) = tokio::join!(
        cache.fetch::<User>(&url, FetchOptions::get()),
        cache.fetch::<User>(&url, FetchOptions::get()),
    );
    assert_eq!(a?.data, b?.data);

    // A third request after the TTL elapses issues a new fetch.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let third: FetchResult<User> = cache.fetch(&url, FetchOptions::get()).await?;
    assert!(!third.from_cache);

    mock.assert_async().await;
    Ok(())
}
