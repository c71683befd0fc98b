#![deny(missing_docs)]
//! The agentic loop engine: drives one task through repeated
//! think/execute/evaluate/refine iterations against a provider router, a
//! tool dispatcher, and session memory, emitting typed progress events
//! throughout.

mod config;
mod engine;
mod error;
mod parsing;
mod types;

pub use config::LoopConfig;
pub use engine::LoopEngine;
pub use error::LoopError;
pub use parsing::{parse_evaluation, parse_think_response, refine_context, EvaluationOutcome, ThinkOutput};
pub use types::{IterationRecord, Request, RunResult, RunStatus};
