//! Errors from session memory.

use thiserror::Error;

/// Errors surfaced by [`crate::SessionMemory`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// `start` was called while a context is already live.
    #[error("a context is already live for this session")]
    AlreadyLive,

    /// An operation that requires a live context was called without one.
    #[error("no context is live for this session")]
    NoActiveContext,

    /// Archival or snapshot I/O failed.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A stored context did not parse as JSON.
    #[error("malformed stored context: {0}")]
    Malformed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
