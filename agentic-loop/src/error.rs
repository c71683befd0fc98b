//! Errors from the agentic loop engine.

use thiserror::Error;

/// Errors surfaced by [`crate::LoopEngine`].
///
/// Per the engine's propagation policy, these never unwind out of a run:
/// they become a terminal [`crate::RunResult`] instead.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoopError {
    /// The provider router could not produce a think/evaluate response.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The LLM did not emit the expected THINKING/PLAN/SUCCESS fields and
    /// no fallback could recover a usable value.
    #[error("response did not parse: {0}")]
    ParseMalformed(String),

    /// The iteration cap was reached.
    #[error("budget exceeded: {0} iterations")]
    BudgetExceeded(u32),

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<agentic_router::RouterError> for LoopError {
    fn from(err: agentic_router::RouterError) -> Self {
        LoopError::ProviderUnavailable(err.to_string())
    }
}

impl From<agentic_memory::MemoryError> for LoopError {
    fn from(err: agentic_memory::MemoryError) -> Self {
        LoopError::Other(Box::new(err))
    }
}
