//! Tests for conditional fetches
//!
//! A wiremock server stands in for the dashboard API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use livefeed_core::{
    CacheEntry, CacheError, CacheStore, ConditionalCache, FetchError, Fetched, FileCacheStore,
    MemoryCacheStore,
};

const STATS: &str = "/api/graph/stats";
const KEY: &str = "graph_stats";

fn memory_cache() -> (ConditionalCache, Arc<MemoryCacheStore>) {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = ConditionalCache::new(store.clone()).unwrap();
    (cache, store)
}

fn url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), STATS)
}

async fn if_none_match_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            r.headers
                .get("if-none-match")
                .map(|v| v.to_str().unwrap().to_string())
        })
        .collect()
}

#[tokio::test]
async fn test_first_fetch_is_unconditional_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(json!({"nodes": 10})),
        )
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    let fetched = cache.fetch_conditional(KEY, &url(&server)).await.unwrap();

    assert_eq!(fetched, Fetched::Fresh(json!({"nodes": 10})));
    let entry = store.get(KEY).unwrap().unwrap();
    assert_eq!(entry.version_tag, "\"v1\"");
    assert_eq!(entry.payload, json!({"nodes": 10}));
    assert_eq!(if_none_match_headers(&server).await, vec![None]);
}

#[tokio::test]
async fn test_not_modified_returns_cached_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(json!({"nodes": 10})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    cache.fetch_with_cache(KEY, &url(&server)).await.unwrap();
    let stored_at = store.get(KEY).unwrap().unwrap().stored_at;

    let fetched = cache.fetch_conditional(KEY, &url(&server)).await.unwrap();
    assert!(fetched.is_unchanged());
    assert_eq!(fetched.into_payload(), json!({"nodes": 10}));

    // A 304 does not rewrite the entry.
    assert_eq!(store.get(KEY).unwrap().unwrap().stored_at, stored_at);
    assert_eq!(
        if_none_match_headers(&server).await,
        vec![None, Some("\"v1\"".to_string())]
    );
}

#[tokio::test]
async fn test_new_version_replaces_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v2\"")
                .set_body_json(json!({"nodes": 11})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .and(header("If-None-Match", "\"v2\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    store
        .put(&CacheEntry::new(KEY, "\"v1\"", json!({"nodes": 10})))
        .unwrap();

    let fresh = cache.fetch_conditional(KEY, &url(&server)).await.unwrap();
    assert_eq!(fresh, Fetched::Fresh(json!({"nodes": 11})));
    assert_eq!(store.get(KEY).unwrap().unwrap().version_tag, "\"v2\"");

    let again = cache.fetch_conditional(KEY, &url(&server)).await.unwrap();
    assert_eq!(again, Fetched::Unchanged(json!({"nodes": 11})));
}

#[tokio::test]
async fn test_response_without_tag_leaves_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nodes": 99})))
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    let previous = CacheEntry::new(KEY, "\"v1\"", json!({"nodes": 10}));
    store.put(&previous).unwrap();

    let payload = cache.fetch_with_cache(KEY, &url(&server)).await.unwrap();
    assert_eq!(payload, json!({"nodes": 99}));
    assert_eq!(store.get(KEY).unwrap(), Some(previous));
}

#[tokio::test]
async fn test_server_error_does_not_touch_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(ResponseTemplate::new(503).insert_header("ETag", "\"v9\""))
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    let previous = CacheEntry::new(KEY, "\"v1\"", json!({"nodes": 10}));
    store.put(&previous).unwrap();

    let err = cache.fetch_with_cache(KEY, &url(&server)).await.unwrap_err();
    assert!(matches!(err, FetchError::HttpError(503)));
    assert_eq!(store.get(KEY).unwrap(), Some(previous));
}

#[tokio::test]
async fn test_invalid_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_string("<html>oops</html>"),
        )
        .mount(&server)
        .await;

    let (cache, store) = memory_cache();
    let err = cache.fetch_with_cache(KEY, &url(&server)).await.unwrap_err();
    assert!(matches!(err, FetchError::JsonError(_)));
    assert!(store.get(KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_not_modified_without_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let (cache, _store) = memory_cache();
    let err = cache.fetch_with_cache(KEY, &url(&server)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotModifiedWithoutCache(ref k) if k == KEY));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let unreachable = format!("http://{}{}", listener.local_addr().unwrap(), STATS);
    drop(listener);

    let (cache, _store) = memory_cache();
    let err = cache.fetch_with_cache(KEY, &unreachable).await.unwrap_err();
    assert!(matches!(err, FetchError::NetworkError(_)));
}

/// Store whose reads and writes always fail.
struct BrokenStore;

impl CacheStore for BrokenStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::InvalidKey(key.to_string()))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        Err(CacheError::InvalidKey(entry.key.clone()))
    }

    fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_broken_store_still_returns_fresh_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(json!({"nodes": 3})),
        )
        .mount(&server)
        .await;

    let cache = ConditionalCache::new(Arc::new(BrokenStore)).unwrap();
    let payload = cache.fetch_with_cache(KEY, &url(&server)).await.unwrap();

    assert_eq!(payload, json!({"nodes": 3}));
    assert_eq!(if_none_match_headers(&server).await, vec![None]);
}

#[tokio::test]
async fn test_file_backed_cache_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(json!({"nodes": 42})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let first = ConditionalCache::new(Arc::new(FileCacheStore::open(temp.path()).unwrap())).unwrap();
    first.fetch_with_cache(KEY, &url(&server)).await.unwrap();
    drop(first);

    let second =
        ConditionalCache::new(Arc::new(FileCacheStore::open(temp.path()).unwrap())).unwrap();
    let fetched = second.fetch_conditional(KEY, &url(&server)).await.unwrap();
    assert_eq!(fetched, Fetched::Unchanged(json!({"nodes": 42})));
}

/// Memory store whose reads and writes stall the calling thread.
struct SlowStore {
    inner: MemoryCacheStore,
    stall: Duration,
}

impl CacheStore for SlowStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        std::thread::sleep(self.stall);
        self.inner.get(key)
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        std::thread::sleep(self.stall);
        self.inner.put(entry)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys()
    }
}

#[tokio::test]
async fn test_slow_store_does_not_stall_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(json!({"nodes": 1})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(SlowStore {
        inner: MemoryCacheStore::new(),
        stall: Duration::from_millis(200),
    });
    let cache = ConditionalCache::new(store.clone()).unwrap();

    // Single-threaded runtime: the ticker only advances if store access
    // leaves the worker free.
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = tokio::spawn({
        let ticks = Arc::clone(&ticks);
        async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    cache.fetch_with_cache(KEY, &url(&server)).await.unwrap();
    ticker.abort();

    assert!(ticks.load(Ordering::SeqCst) >= 10);
    assert_eq!(store.get(KEY).unwrap().unwrap().version_tag, "\"v1\"");
}
