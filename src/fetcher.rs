//! The network boundary: loading the latest value for a request id.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::env;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use crate::error::FetchError;

/// Loads the latest value for a request id.
///
/// The request id is the cache key and is passed through untouched: two ids that differ
/// only by a trailing slash are two different requests.
#[async_trait]
pub trait Fetcher<V>: Send + Sync {
    /// Fetch and decode the current value for `request_id`.
    async fn fetch(&self, request_id: &str) -> Result<V, FetchError>;
}

/// Adapts an async closure into a [`Fetcher`].
///
/// # Example
/// ```ignore
/// let fetcher = FnFetcher::new(|request_id| async move {
///     db.load(&request_id).await.map_err(|e| FetchError::Origin(e.to_string()))
/// });
/// ```
pub struct FnFetcher<F> {
    load: F,
}

impl<F> FnFetcher<F> {
    /// Wrap the given closure. It receives the request id by value.
    pub fn new(load: F) -> Self {
        FnFetcher { load }
    }
}

#[async_trait]
impl<V, F, Fut> Fetcher<V> for FnFetcher<F>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
{
    async fn fetch(&self, request_id: &str) -> Result<V, FetchError> {
        (self.load)(request_id.to_string()).await
    }
}

/// Configuration for HttpFetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,

    /// Maximum time for the whole request, including reading the body.
    pub timeout: Duration,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        HttpFetcherConfig {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            user_agent: concat!("stale-refresh/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpFetcherConfig {
    /// Defaults, overridden by `STALE_REFRESH_CONNECT_TIMEOUT_MS`,
    /// `STALE_REFRESH_TIMEOUT_MS` and `STALE_REFRESH_USER_AGENT` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        HttpFetcherConfig {
            connect_timeout: env_millis("STALE_REFRESH_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.connect_timeout),
            timeout: env_millis("STALE_REFRESH_TIMEOUT_MS").unwrap_or(defaults.timeout),
            user_agent: env::var("STALE_REFRESH_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

/// HTTP fetcher: issues a `GET` to the request id and decodes the JSON body.
///
/// Any non-2xx status is a [`FetchError::Status`], an undecodable body is a
/// [`FetchError::Decode`], everything else that goes wrong is a [`FetchError::Transport`].
pub struct HttpFetcher<V> {
    client: reqwest::Client,
    _marker: PhantomData<fn() -> V>,
}

impl<V> HttpFetcher<V> {
    /// Create a new HttpFetcher with its own client.
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Create a new HttpFetcher sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpFetcher {
            client,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<V> Fetcher<V> for HttpFetcher<V>
where
    V: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, request_id: &str) -> Result<V, FetchError> {
        let response = self
            .client
            .get(request_id)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::transport(request_id, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Origin returned status {} for {}", status, request_id);
            return Err(FetchError::Status {
                request_id: request_id.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(request_id, e))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::decode(request_id, e))
    }
}
