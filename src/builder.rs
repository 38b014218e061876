//! Builder API for wiring a cache out of a store and a fetcher.

use std::sync::Arc;

use crate::fetcher::Fetcher;
use crate::store::Store;
use crate::stores::memory::HashMapStore;
use crate::swr::SwrCache;

/// Builder for [`SwrCache`] instances.
///
/// The fetcher is required. Without an explicit store, each built cache gets its own
/// empty [`HashMapStore`], so independent caches never share state.
///
/// # Example
///
/// ```ignore
/// use stale_refresh::{CacheBuilder, HttpFetcher, HttpFetcherConfig, Payload};
/// use std::sync::Arc;
///
/// let fetcher = Arc::new(HttpFetcher::<Payload>::new(HttpFetcherConfig::from_env())?);
/// let cache = CacheBuilder::new(fetcher).build();
/// ```
pub struct CacheBuilder<V> {
    fetcher: Arc<dyn Fetcher<V>>,
    store: Option<Arc<dyn Store<V>>>,
}

impl<V> CacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new CacheBuilder around the given fetcher.
    pub fn new(fetcher: Arc<dyn Fetcher<V>>) -> Self {
        CacheBuilder {
            fetcher,
            store: None,
        }
    }

    /// Use the given store instead of a private in-memory one.
    ///
    /// Passing the same store to several builders makes those caches share values.
    pub fn store(mut self, store: Arc<dyn Store<V>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the cache.
    pub fn build(self) -> SwrCache<V> {
        let store: Arc<dyn Store<V>> = match self.store {
            Some(store) => store,
            None => Arc::new(HashMapStore::default()),
        };
        SwrCache::new(store, self.fetcher)
    }
}
