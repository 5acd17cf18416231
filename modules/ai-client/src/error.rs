use thiserror::Error;

/// Uniform error classification across extraction providers. The roster
/// dispatches on the class, never on exception text.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider quota/rate limit hit (HTTP 429 or equivalent).
    #[error("rate limited")]
    RateLimited,

    /// The requested model does not exist for this account (HTTP 404).
    #[error("model not found")]
    ModelNotFound,

    /// The provider answered but returned no usable text.
    #[error("empty response")]
    Empty,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl ProviderError {
    /// Classify a non-2xx HTTP status into the uniform taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => ProviderError::RateLimited,
            404 => ProviderError::ModelNotFound,
            _ => ProviderError::Api { status, message },
        }
    }
}
