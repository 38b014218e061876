use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A snapshot of one store slot: the last known value for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cache key, usually the request URL. Keys are compared verbatim.
    pub key: String,

    /// The last value fetched for the key.
    pub value: V,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry.
    pub fn new(key: impl Into<String>, value: V) -> Self {
        CacheEntry {
            key: key.into(),
            value,
        }
    }
}

/// The state delivered to a consumer at a point in time.
///
/// `is_loading` stays `true` until a value (cached or fetched) has been delivered for the
/// current activation. A failed refresh ends loading and carries the error, keeping the
/// value that was on screen before.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<V> {
    /// The best known value.
    pub value: V,

    /// Whether the consumer is still waiting for its first real value.
    pub is_loading: bool,

    /// Set when the refresh for this activation failed.
    pub error: Option<FetchError>,
}

impl<V> RequestState<V> {
    /// Initial state on a cache miss: the caller's default, still loading.
    pub fn loading(default: V) -> Self {
        RequestState {
            value: default,
            is_loading: true,
            error: None,
        }
    }

    /// Initial state on a cache hit: the cached value, served while the refresh runs.
    pub fn serving(cached: V) -> Self {
        RequestState {
            value: cached,
            is_loading: false,
            error: None,
        }
    }

    /// Final state after a successful refresh.
    pub fn settled(fresh: V) -> Self {
        RequestState {
            value: fresh,
            is_loading: false,
            error: None,
        }
    }

    /// Final state after a failed refresh. The value shown so far is kept.
    pub fn failed(self, error: FetchError) -> Self {
        RequestState {
            value: self.value,
            is_loading: false,
            error: Some(error),
        }
    }

    /// Returns `(value, is_loading)`, the pair a UI renders from.
    pub fn as_pair(&self) -> (&V, bool) {
        (&self.value, self.is_loading)
    }
}
