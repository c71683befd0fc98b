//! Errors from provider routing.

use thiserror::Error;

/// Errors surfaced by [`crate::ProviderRouter`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RouterError {
    /// No provider is registered under the requested name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The requested (or selected) provider reports itself unavailable.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No routing rule matched and no fallback provider was available.
    #[error("no provider available")]
    NoProviderAvailable,

    /// The backend timed out.
    #[error("backend timeout: {0}")]
    BackendTimeout(String),

    /// The backend rejected the request.
    #[error("backend rejected: {0}")]
    BackendRejected(String),

    /// The backend's response did not parse.
    #[error("backend malformed response: {0}")]
    BackendMalformed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<neuron_turn::ProviderError> for RouterError {
    fn from(err: neuron_turn::ProviderError) -> Self {
        use neuron_turn::ProviderError as PE;
        match err {
            PE::RequestFailed(msg) => RouterError::BackendTimeout(msg),
            PE::RateLimited => RouterError::BackendRejected("rate limited".into()),
            PE::AuthFailed(msg) => RouterError::ProviderUnavailable(msg),
            PE::InvalidResponse(msg) => RouterError::BackendMalformed(msg),
            PE::Other(e) => RouterError::Other(e),
            other => RouterError::Other(Box::new(other)),
        }
    }
}
