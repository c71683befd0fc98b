//! Construction-time configuration for the agentic loop engine.

use std::time::Duration;

/// Static configuration for a [`crate::LoopEngine`].
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum iterations per run.
    pub max_iterations: u32,
    /// Deadline for the think step.
    pub think_deadline: Duration,
    /// Deadline for the execute step.
    pub execute_deadline: Duration,
    /// Deadline for the evaluate step.
    pub evaluate_deadline: Duration,
    /// Identity preamble prepended to every think prompt.
    pub system_prompt: String,
    /// Iteration count after which the refinement appendix ("consider
    /// alternative approaches") is attached.
    pub alternative_approach_threshold: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            think_deadline: Duration::from_secs(60),
            execute_deadline: Duration::from_secs(120),
            evaluate_deadline: Duration::from_secs(60),
            system_prompt: "You are an autonomous coding agent working step by step toward a goal.".to_string(),
            alternative_approach_threshold: 5,
        }
    }
}
