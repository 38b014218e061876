use std::sync::Arc;

use crate::entry::RequestState;
use crate::error::{CacheError, FetchError};
use crate::fetcher::Fetcher;
use crate::sequence::Sequencer;
use crate::store::Store;

/// Outcome of one refresh round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<V> {
    /// The fetched value was the newest for its key and has been written to the store.
    Applied(V),
    /// A newer request for the same key was issued while this one was in flight, so the
    /// fetched value was discarded. Carries what the store held once no newer request was
    /// in flight, if anything.
    Superseded(Option<V>),
    /// The fetcher failed. The store is untouched.
    Failed(FetchError),
}

impl<V> Refresh<V> {
    /// The state a consumer sees once this refresh lands on top of `shown`.
    pub fn into_state(self, shown: RequestState<V>) -> RequestState<V> {
        match self {
            Refresh::Applied(value) | Refresh::Superseded(Some(value)) => {
                RequestState::settled(value)
            }
            Refresh::Superseded(None) => RequestState::settled(shown.value),
            Refresh::Failed(error) => shown.failed(error),
        }
    }
}

/// Stale-while-revalidate orchestration over an injected store and fetcher.
///
/// On each activation the cached value (or the caller's default) is emitted right away,
/// then the latest value is always fetched, written back and emitted. Clones share the
/// same store, fetcher and request ordering.
pub struct SwrCache<V> {
    store: Arc<dyn Store<V>>,
    fetcher: Arc<dyn Fetcher<V>>,
    /// Orders writes per key so that stale responses are discarded.
    sequencer: Arc<Sequencer>,
}

impl<V> Clone for SwrCache<V> {
    fn clone(&self) -> Self {
        SwrCache {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            sequencer: Arc::clone(&self.sequencer),
        }
    }
}

impl<V> SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new SWR cache.
    ///
    /// # Arguments
    /// * `store` - Where last known values are kept
    /// * `fetcher` - How the latest value for a key is loaded
    pub fn new(store: Arc<dyn Store<V>>, fetcher: Arc<dyn Fetcher<V>>) -> Self {
        SwrCache {
            store,
            fetcher,
            sequencer: Arc::new(Sequencer::default()),
        }
    }

    /// The store backing this cache.
    pub fn store(&self) -> &Arc<dyn Store<V>> {
        &self.store
    }

    /// Return the cached value.
    ///
    /// The response will be `None` for cache misses.
    pub async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        self.store.get(key).await
    }

    /// Set the value in the cache.
    ///
    /// This counts as the newest write for the key: refreshes already in flight for it
    /// will not overwrite the value.
    pub async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        let mut guard = self.sequencer.lock().await;
        let _ticket = guard.issue(key);
        self.store.set(key, value).await
    }

    /// The first state of an activation, before any network round-trip.
    ///
    /// - Hit: the cached value, not loading
    /// - Miss: `default`, loading
    ///
    /// A failing store read is treated as a miss.
    pub async fn initial_state(&self, key: &str, default: &V) -> RequestState<V> {
        match self.store.get(key).await {
            Ok(Some(cached)) => {
                tracing::trace!("Cache hit, serving stale value: key={}", key);
                RequestState::serving(cached)
            }
            Ok(None) => {
                tracing::trace!("Cache miss, serving default: key={}", key);
                RequestState::loading(default.clone())
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read from store: tier={}, key={}, error={}",
                    self.store.name(),
                    key,
                    e
                );
                RequestState::loading(default.clone())
            }
        }
    }

    /// Fetch the latest value for `key` and write it back if no newer request was issued.
    ///
    /// A superseded request waits until the newer ones have settled and then reports
    /// the stored value instead of its own.
    pub async fn revalidate(&self, key: &str) -> Refresh<V> {
        let ticket = self.sequencer.issue(key).await;
        let seq = ticket.seq();

        let value = match self.fetcher.fetch(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to revalidate: key={}, error={}", key, e);
                return Refresh::Failed(e);
            }
        };

        let guard = self.sequencer.lock().await;
        if !guard.is_latest(key, seq) {
            tracing::debug!("Discarding superseded response: key={}, seq={}", key, seq);
            drop(guard);
            drop(ticket);
            return Refresh::Superseded(self.settled_value(key).await);
        }

        if let Err(e) = self.store.set(key, value.clone()).await {
            tracing::warn!(
                "Failed to write revalidated value: tier={}, key={}, error={}",
                self.store.name(),
                key,
                e
            );
        }
        drop(guard);

        drop(ticket);

        tracing::debug!("Revalidated: key={}, seq={}", key, seq);
        Refresh::Applied(value)
    }

    /// Wait until no request for `key` is in flight, then read the store.
    async fn settled_value(&self, key: &str) -> Option<V> {
        let _guard = loop {
            let guard = self.sequencer.lock().await;
            let Some((latest, mut settled)) = guard.in_flight(key) else {
                break guard;
            };
            drop(guard);
            if settled.wait_for(|s| *s >= latest).await.is_err() {
                break self.sequencer.lock().await;
            }
        };

        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    "Failed to read settled value: tier={}, key={}, error={}",
                    self.store.name(),
                    key,
                    e
                );
                None
            }
        }
    }

    /// Run one full activation: emit the initial state, refresh once, emit the final state.
    ///
    /// Returns the final state.
    ///
    /// # Example
    /// ```ignore
    /// let state = cache.activate("users/1", &default, |state| {
    ///     render(&state.value, state.is_loading);
    /// }).await;
    /// ```
    pub async fn activate<F>(&self, key: &str, default: &V, mut emit: F) -> RequestState<V>
    where
        F: FnMut(&RequestState<V>),
    {
        let initial = self.initial_state(key, default).await;
        emit(&initial);

        let settled = self.revalidate(key).await.into_state(initial);
        emit(&settled);
        settled
    }
}
