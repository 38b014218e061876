//! Integration tests for stale-refresh subscriptions over mock and HTTP origins.

use futures::future::join_all;
use serde_json::{Value, json};
use stale_refresh::{
    CacheBuilder, CacheEntry, FetchError, Fetcher, FnFetcher, HashMapStore, HttpFetcher,
    HttpFetcherConfig, Payload, RequestState, Store, SwrCache,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ============================================================================
// Mock Network
// ============================================================================

/// Answers from a table of canned bodies after a fixed latency, counting calls per key.
#[derive(Clone)]
struct MockNetwork {
    bodies: Arc<Mutex<HashMap<String, Value>>>,
    calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl MockNetwork {
    fn new(latency_ms: u64) -> Self {
        MockNetwork {
            bodies: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            latency: Duration::from_millis(latency_ms),
        }
    }

    fn respond(&self, key: &str, body: Value) {
        self.bodies.lock().unwrap().insert(key.to_string(), body);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fetcher(&self) -> Arc<dyn Fetcher<Payload>> {
        let network = self.clone();
        Arc::new(FnFetcher::new(move |key: String| {
            let network = network.clone();
            async move {
                network.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(network.latency).await;
                let body = network.bodies.lock().unwrap().get(&key).cloned();
                body.ok_or(FetchError::Status {
                    request_id: key,
                    status: 404,
                })
            }
        }))
    }
}

fn cache_over(
    network: &MockNetwork,
    entries: Vec<CacheEntry<Payload>>,
) -> (SwrCache<Payload>, Arc<HashMapStore<Payload>>) {
    let store = Arc::new(HashMapStore::with_entries(entries));
    let cache = CacheBuilder::new(network.fetcher())
        .store(store.clone())
        .build();
    (cache, store)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_cache_shows_default_then_fetched_value() {
    let network = MockNetwork::new(200);
    network.respond("users/1", json!({ "name": "Ada" }));
    let (cache, store) = cache_over(&network, vec![]);

    let default = Arc::new(json!({ "name": "" }));
    let user = cache.subscribe("users/1", default.clone()).await;

    let state = user.state();
    assert_eq!(state.as_pair(), (&json!({ "name": "" }), true));

    let settled = user
        .watch()
        .wait_for(|s| !s.is_loading)
        .await
        .unwrap()
        .clone();
    assert_eq!(settled, RequestState::settled(json!({ "name": "Ada" })));
    assert_eq!(
        store.get("users/1").await.unwrap(),
        Some(json!({ "name": "Ada" }))
    );
    assert_eq!(network.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cached_value_served_then_refreshed() {
    let network = MockNetwork::new(200);
    network.respond("users/1", json!({ "name": "Ada2" }));
    let (cache, store) = cache_over(
        &network,
        vec![CacheEntry::new("users/1", json!({ "name": "Ada" }))],
    );

    let user = cache
        .subscribe("users/1", Arc::new(json!({ "name": "" })))
        .await;
    assert_eq!(user.state(), RequestState::serving(json!({ "name": "Ada" })));

    let mut rx = user.watch();
    rx.wait_for(|s| s.value == json!({ "name": "Ada2" }))
        .await
        .unwrap();

    assert_eq!(user.state(), RequestState::settled(json!({ "name": "Ada2" })));
    assert_eq!(
        store.get("users/1").await.unwrap(),
        Some(json!({ "name": "Ada2" }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_switching_keys_starts_a_fresh_cycle() {
    let network = MockNetwork::new(200);
    network.respond("users/1", json!({ "name": "Ada" }));
    network.respond("users/2", json!({ "name": "Grace" }));
    let (cache, _store) = cache_over(&network, vec![]);
    let default = Arc::new(json!({ "name": "" }));

    let mut user = cache.subscribe("users/1", default.clone()).await;
    user.watch().wait_for(|s| !s.is_loading).await.unwrap();

    assert!(user.update("users/2", &default).await);
    assert_eq!(user.state(), RequestState::loading(json!({ "name": "" })));

    user.watch().wait_for(|s| !s.is_loading).await.unwrap();
    assert_eq!(user.state().value, json!({ "name": "Grace" }));

    // Switching back hits the cache: no loading flash.
    assert!(user.update("users/1", &default).await);
    assert_eq!(user.state(), RequestState::serving(json!({ "name": "Ada" })));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(network.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_resubscribing_with_same_inputs_is_a_no_op() {
    let network = MockNetwork::new(200);
    network.respond("users/1", json!({ "name": "Ada" }));
    let (cache, _store) = cache_over(&network, vec![]);
    let default = Arc::new(json!({ "name": "" }));

    let mut user = cache.subscribe("users/1", default.clone()).await;
    for _ in 0..5 {
        assert!(!user.update("users/1", &default).await);
    }
    assert!(user.state().is_loading);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(network.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_origin_failure_is_reported() {
    let network = MockNetwork::new(200);
    let (cache, store) = cache_over(&network, vec![]);

    let user = cache
        .subscribe("users/404", Arc::new(json!({ "name": "" })))
        .await;
    let state = user
        .watch()
        .wait_for(|s| !s.is_loading)
        .await
        .unwrap()
        .clone();

    assert_eq!(state.value, json!({ "name": "" }));
    assert_eq!(
        state.error,
        Some(FetchError::Status {
            request_id: "users/404".into(),
            status: 404
        })
    );
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_every_subscriber_refreshes_independently() {
    let network = MockNetwork::new(200);
    network.respond("users/1", json!({ "name": "Ada" }));
    let (cache, store) = cache_over(&network, vec![]);
    let default = Arc::new(json!({ "name": "" }));

    let subscribers = join_all((0..10).map(|_| cache.subscribe("users/1", default.clone()))).await;

    let settled = join_all(subscribers.iter().map(|s| {
        let mut rx = s.watch();
        async move { rx.wait_for(|s| !s.is_loading).await.unwrap().clone() }
    }))
    .await;

    assert_eq!(network.calls(), 10);
    assert!(
        settled
            .iter()
            .all(|s| *s == RequestState::settled(json!({ "name": "Ada" })))
    );
    assert_eq!(store.len().await, 1);
}

// ============================================================================
// HTTP Origin
// ============================================================================

/// Serve `body` to every connection, counting requests.
async fn serve_json(body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            hits_clone.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), hits)
}

#[tokio::test]
async fn test_http_origin_end_to_end() {
    let (base, hits) = serve_json(r#"{"data":"users/1"}"#).await;
    let url = format!("{}/users/1", base);

    let fetcher = Arc::new(HttpFetcher::<Payload>::new(HttpFetcherConfig::default()).unwrap());
    let cache = CacheBuilder::new(fetcher).build();
    let default = Arc::new(json!({ "data": "" }));

    let page = cache.subscribe(&url, default.clone()).await;
    assert!(page.state().is_loading);

    let state = page
        .watch()
        .wait_for(|s| !s.is_loading)
        .await
        .unwrap()
        .clone();
    assert_eq!(state, RequestState::settled(json!({ "data": "users/1" })));

    // Second subscriber sees the cached body right away and still refreshes.
    let again = cache.subscribe(&url, default).await;
    assert_eq!(
        again.state(),
        RequestState::serving(json!({ "data": "users/1" }))
    );
    again.watch().changed().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
