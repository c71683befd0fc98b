#![deny(missing_docs)]
//! Minimal MCP client surface consumed by the agentic execution core.
//!
//! The core treats MCP servers as opaque query collaborators: connect,
//! list what's connected, send text, get text back. Server lifecycle
//! (spawning, capability negotiation beyond tool discovery) is the
//! embedding application's concern, not the core's.

pub mod client;
pub mod error;

pub use client::McpClient;
pub use error::McpError;
