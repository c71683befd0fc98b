#![deny(missing_docs)]
//! Capability-scored routing across multiple LLM provider backends.
//!
//! Wraps the workspace's non-object-safe [`neuron_turn::Provider`] (RPITIT,
//! generic-only) behind an object-safe `ask`-shaped trait so the router can
//! hold a heterogeneous set of concrete providers (Anthropic, OpenAI,
//! Ollama-style) behind one map. The same adapter pattern is used elsewhere
//! in this workspace to give a generic, non-object-safe trait an object-safe
//! boundary (`ReactOperator<P: Provider>` implementing `layer0::Operator`).

mod adapter;
mod config;
mod error;
mod metrics;
mod router;

pub use adapter::{AskCapable, ModelDescriptor, ProviderAdapter};
pub use config::RouterConfig;
pub use error::RouterError;
pub use metrics::{ProviderDescriptor, ProviderMetrics};
pub use router::{AskContext, Complexity, ProviderRouter, Recommendation};
