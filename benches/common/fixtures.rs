use serde::{Deserialize, Serialize};
use stale_refresh::{FetchError, Fetcher, FnFetcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Test data structure for benchmarks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchUser {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl BenchUser {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
        }
    }
}

/// Simulated origin with configurable latency.
///
/// Request ids look like `users/<id>`; anything else is a 404.
#[derive(Clone)]
pub struct FakeOrigin {
    latency_ms: u64,
    request_count: Arc<AtomicUsize>,
}

impl FakeOrigin {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn get(&self, request_id: &str) -> Result<BenchUser, FetchError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        // Simulate network latency
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        request_id
            .strip_prefix("users/")
            .and_then(|id| id.parse().ok())
            .map(BenchUser::new)
            .ok_or(FetchError::Status {
                request_id: request_id.to_string(),
                status: 404,
            })
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher<BenchUser>> {
        let origin = self.clone();
        Arc::new(FnFetcher::new(move |request_id: String| {
            let origin = origin.clone();
            async move { origin.get(&request_id).await }
        }))
    }

    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Sequential request ids: `users/0`, `users/1`, ...
pub fn user_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("users/{}", i)).collect()
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn test_fake_origin() {
        use super::FakeOrigin;

        let origin = FakeOrigin::new(1);

        let user = origin.get("users/7").await.unwrap();
        assert_eq!(user.id, 7);
        assert!(origin.get("posts/7").await.is_err());

        assert_eq!(origin.request_count(), 2);
    }
}
