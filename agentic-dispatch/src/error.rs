//! Errors from tool dispatch.

use thiserror::Error;

/// Errors surfaced by [`crate::Dispatcher`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No tool scored above the dispatcher's threshold.
    #[error("no tool matched")]
    NoToolMatched,

    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    ToolMissing(String),

    /// A tool execution failed for a reason other than timeout/cancel.
    #[error("tool failed: {0}")]
    ToolFailed(String),

    /// A tool execution exceeded its deadline.
    #[error("tool timed out: {0}")]
    Timeout(String),

    /// A tool execution was cancelled.
    #[error("tool cancelled: {0}")]
    Cancelled(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<neuron_tool::ToolError> for DispatchError {
    fn from(err: neuron_tool::ToolError) -> Self {
        use neuron_tool::ToolError as TE;
        match err {
            TE::NotFound(name) => DispatchError::ToolMissing(name),
            TE::ExecutionFailed(msg) => DispatchError::ToolFailed(msg),
            TE::InvalidInput(msg) => DispatchError::ToolFailed(msg),
            TE::Other(e) => DispatchError::Other(e),
            other => DispatchError::Other(Box::new(other)),
        }
    }
}
