//! Subscribe to a JSON endpoint twice: the first subscription loads from the network,
//! the second is served from the cache while it refreshes.
//!
//! Usage: `cargo run --example users -- [URL]`
//! Set `RUST_LOG=stale_refresh=debug` to watch the cache decisions.

use serde_json::json;
use stale_refresh::{CacheBuilder, HttpFetcher, HttpFetcherConfig, Payload, RequestState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn render(label: &str, state: &RequestState<Payload>) {
    let (value, is_loading) = state.as_pair();
    match (&state.error, is_loading) {
        (Some(error), _) => println!("[{}] error: {} (showing {})", label, error, value),
        (None, true) => println!("[{}] Loading... (showing {})", label, value),
        (None, false) => println!("[{}] {}", label, value),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://jsonplaceholder.typicode.com/users/1".to_string());

    let config = HttpFetcherConfig::from_env();
    let timeout = config.timeout;
    let fetcher = Arc::new(HttpFetcher::<Payload>::new(config)?);
    let cache = CacheBuilder::new(fetcher).build();

    // One default for every subscription: a new Arc would count as a new request.
    let default = Arc::new(json!({ "name": "" }));

    for label in ["first", "second"] {
        let subscription = cache.subscribe(&url, default.clone()).await;
        let mut rx = subscription.watch();
        render(label, &rx.borrow_and_update());

        // The refresh may already have landed; don't wait past the request timeout.
        let _ = tokio::time::timeout(timeout, rx.changed()).await;
        render(label, &rx.borrow());
    }

    Ok(())
}
