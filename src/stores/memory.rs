use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::Store;

/// Configuration for HashMapStore.
#[derive(Debug, Clone, Default)]
pub struct HashMapStoreConfig {
    /// Number of keys to reserve space for up front.
    ///
    /// `0` allocates lazily on the first write.
    pub initial_capacity: usize,
}

/// Thread-safe in-memory store using HashMap with RwLock.
///
/// Entries live for as long as the store does. There is no eviction, no TTL and no
/// way to clear the store: the only mutation is an overwriting `set`.
pub struct HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    state: RwLock<HashMap<String, V>>,
}

impl<V> HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    /// Create a new HashMapStore with the given configuration.
    pub fn new(config: HashMapStoreConfig) -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
        }
    }

    /// Create a store that already holds the given entries.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CacheEntry<V>>,
    {
        let map = entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();
        HashMapStore {
            state: RwLock::new(map),
        }
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    /// Whether nothing has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }

    /// Snapshot of every entry, in no particular order.
    pub async fn entries(&self) -> Vec<CacheEntry<V>> {
        self.state
            .read()
            .await
            .iter()
            .map(|(key, value)| CacheEntry::new(key.clone(), value.clone()))
            .collect()
    }
}

impl<V> Default for HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new(HashMapStoreConfig::default())
    }
}

#[async_trait]
impl<V> Store<V> for HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let state = self.state.read().await;
        Ok(state.get(key).cloned())
    }

    async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.insert(key.to_string(), value);
        Ok(())
    }
}
