use async_trait::async_trait;

use crate::error::CacheError;

/// A store is a common interface for reading and writing the last known value of a key.
///
/// Stores never evict or expire on their own: a value stays until it is overwritten.
/// The most recent `set` for a key always wins.
#[async_trait]
pub trait Store<V>: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "metrics"
    fn name(&self) -> &'static str;

    /// Return the cached value.
    ///
    /// The response must be `None` for cache misses. Reads have no side effects.
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError>;

    /// Sets the value for the given key, replacing whatever was there.
    async fn set(&self, key: &str, value: V) -> Result<(), CacheError>;
}
