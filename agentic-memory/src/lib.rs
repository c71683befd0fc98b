#![deny(missing_docs)]
//! Durable cross-turn agentic context tracking.
//!
//! Holds at most one live [`AgenticContext`] per session and decides
//! whether a new free-form request continues the active task, so the
//! agentic loop engine can pick up a prior objective instead of starting
//! fresh every turn.

mod config;
mod context;
mod error;
mod keywords;
mod memory;
mod persistence;

pub use config::MemoryConfig;
pub use context::AgenticContext;
pub use error::MemoryError;
pub use memory::{ContextUpdate, SessionMemory};
