/// Error type for cache store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A store operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },
    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a [`Fetcher`](crate::Fetcher) when the latest value could not be loaded.
///
/// Fetch errors are local to one activation. They end up in
/// [`RequestState::error`](crate::RequestState) and never abort the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("request to '{request_id}' failed: {message}")]
    Transport { request_id: String, message: String },
    /// The origin answered with a non-success status.
    #[error("request to '{request_id}' returned status {status}")]
    Status { request_id: String, status: u16 },
    /// The response body could not be decoded into the payload type.
    #[error("response from '{request_id}' could not be decoded: {message}")]
    Decode { request_id: String, message: String },
    /// A custom origin reported a failure.
    #[error("origin error: {0}")]
    Origin(String),
    /// The HTTP client could not be built from its configuration.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Create a new transport error.
    pub fn transport(request_id: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Transport {
            request_id: request_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a new decode error.
    pub fn decode(request_id: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Decode {
            request_id: request_id.into(),
            message: message.to_string(),
        }
    }
}
