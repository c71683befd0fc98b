//! Errors from MCP client operations.

use thiserror::Error;

/// Errors talking to an MCP server.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum McpError {
    /// The MCP server process could not be spawned or the transport failed to connect.
    #[error("transport error: {0}")]
    Transport(String),

    /// The MCP session failed to initialize.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The named server is not known to this client.
    #[error("unknown server: {0}")]
    UnknownServer(String),

    /// The server returned an error for a `tools/call` request.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
