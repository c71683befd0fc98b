#![deny(missing_docs)]
//! Intent-scored tool routing, coordination, and result coercion.
//!
//! Extends the workspace's object-safe [`neuron_tool::ToolDyn`] with the
//! scoring and categorisation surface a dispatcher needs, then provides a
//! single `process_request` entry point that scores every registered tool
//! against a free-form request and either runs the best match or
//! coordinates several tools' parallel-safe and serial execution.

mod config;
mod context;
mod dispatcher;
mod error;
mod registry;
mod tool;

pub use config::{DispatcherConfig, SCORE_THRESHOLD};
pub use context::{CancelSignal, ToolContext, ToolResult};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use registry::{DispatchRegistry, RegistryStats};
pub use tool::{parallel_safe, DispatchTool};
