//! Live subscriptions: the consumer-facing side of the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::entry::RequestState;
use crate::swr::SwrCache;

/// Binds a consumer to a key and a default value.
///
/// A subscription holds the `(value, is_loading)` the consumer renders from and re-runs
/// an activation whenever its key or its default changes. The default is compared by
/// reference (`Arc::ptr_eq`), not by content: callers must keep passing the same `Arc`
/// to avoid a refetch on every update.
///
/// Every activation resets the state to its initial emission and spawns one refresh.
/// A refresh that lands after a newer activation (or after the subscription was
/// dropped) leaves the state alone. It is not cancelled, so it still updates the store.
///
/// # Example
/// ```ignore
/// let default = Arc::new(json!({ "name": "" }));
/// let mut user = cache.subscribe("users/1", default.clone()).await;
///
/// let mut rx = user.watch();
/// let state = rx.wait_for(|s| !s.is_loading).await?;
/// ```
pub struct Subscription<V> {
    cache: SwrCache<V>,
    key: String,
    default: Arc<V>,
    /// Bumped on every activation and on drop. Refreshes only apply to their own generation.
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<RequestState<V>>>,
}

impl<V> Subscription<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Subscribe to `key` and run the first activation.
    ///
    /// The returned subscription already holds the initial state. Must be called from
    /// within a tokio runtime.
    pub async fn subscribe(cache: &SwrCache<V>, key: &str, default: Arc<V>) -> Self {
        let initial = cache.initial_state(key, &default).await;
        let (state, _) = watch::channel(initial);

        let subscription = Subscription {
            cache: cache.clone(),
            key: key.to_string(),
            default,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        };
        subscription.spawn_refresh(0);
        subscription
    }

    /// Point the subscription at `key` with `default`.
    ///
    /// Re-activates when the key differs or `default` is a different `Arc` than the
    /// current one, and returns whether it did.
    pub async fn update(&mut self, key: &str, default: &Arc<V>) -> bool {
        if self.key == key && Arc::ptr_eq(&self.default, default) {
            return false;
        }

        tracing::trace!("Re-activating subscription: from={}, to={}", self.key, key);
        let initial = self.cache.initial_state(key, default).await;

        // Set after the last await: a dropped update keeps the old inputs.
        self.key = key.to_string();
        self.default = Arc::clone(default);
        let generation = &self.generation;
        let mut activation = 0;
        self.state.send_modify(|state| {
            activation = generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = initial;
        });

        self.spawn_refresh(activation);
        true
    }

    /// The latest state.
    pub fn state(&self) -> RequestState<V> {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<RequestState<V>> {
        self.state.subscribe()
    }

    /// The key of the current activation.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The default of the current activation.
    pub fn default_value(&self) -> &Arc<V> {
        &self.default
    }

    fn spawn_refresh(&self, activation: u64) {
        let cache = self.cache.clone();
        let key = self.key.clone();
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);

        tokio::spawn(async move {
            let refresh = cache.revalidate(&key).await;

            // Checked under the channel lock so a concurrent re-activation can't interleave.
            state.send_if_modified(|shown| {
                if generation.load(Ordering::SeqCst) != activation {
                    tracing::debug!("Dropping refresh of a retired activation: key={}", key);
                    return false;
                }
                *shown = refresh.into_state(shown.clone());
                true
            });
        });
    }
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl<V> SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Subscribe to `key`. See [`Subscription`].
    pub async fn subscribe(&self, key: &str, default: Arc<V>) -> Subscription<V> {
        Subscription::subscribe(self, key, default).await
    }
}
