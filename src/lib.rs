//! stale-refresh - A stale-while-revalidate data cache for UI consumers
//!
//! On every request for a key this library:
//! - Immediately returns the best known value (cached, or a caller-provided default)
//!   together with a loading flag
//! - Always fetches the latest value over the network in the background
//! - Writes the result back to a shared store and notifies the consumer
//!
//! Responses are ordered per key, so a slow response never overwrites a newer one,
//! and fetch failures are surfaced as an error state instead of being lost.
//!
//! # Example
//!
//! ```ignore
//! use stale_refresh::{CacheBuilder, HttpFetcher, HttpFetcherConfig, Payload};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Arc::new(HttpFetcher::<Payload>::new(HttpFetcherConfig::default())?);
//!     let cache = CacheBuilder::new(fetcher).build();
//!
//!     // Keep the default in one place: a new Arc re-triggers the fetch.
//!     let default = Arc::new(json!({ "name": "" }));
//!     let user = cache.subscribe("https://example.com/users/1", default.clone()).await;
//!
//!     let state = user.state();
//!     let (value, is_loading) = state.as_pair();
//!     // ... render, then wait for the refresh
//!     let state = user.watch().wait_for(|s| !s.is_loading).await?.clone();
//!     Ok(())
//! }
//! ```

mod builder;
mod entry;
mod error;
mod fetcher;
mod sequence;
mod store;
pub mod stores;
mod subscription;
mod swr;

// Re-export public API
pub use builder::CacheBuilder;
pub use entry::{CacheEntry, RequestState};
pub use error::{CacheError, FetchError};
pub use fetcher::{Fetcher, FnFetcher, HttpFetcher, HttpFetcherConfig};
pub use store::Store;
pub use stores::memory::{HashMapStore, HashMapStoreConfig};
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use subscription::Subscription;
pub use swr::{Refresh, SwrCache};

/// JSON-shaped payload, the usual value type for HTTP-backed caches.
pub type Payload = serde_json::Value;
