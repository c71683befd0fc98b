//! Per-run and per-iteration data model.

use agentic_events::Verdict;
use std::time::Duration;

/// Immutable per-turn request: created by the orchestrator, destroyed
/// after the turn.
#[derive(Debug, Clone)]
pub struct Request {
    /// Free-form task text.
    pub task: String,
    /// Optional iteration cap override.
    pub max_iterations: Option<u32>,
    /// Whether thinking/planning text should be emitted verbosely.
    pub verbose: bool,
    /// Optional tool-name allowlist.
    pub tools_allowlist: Option<Vec<String>>,
}

impl Request {
    /// Build a request for `task` with no overrides.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            max_iterations: None,
            verbose: false,
            tools_allowlist: None,
        }
    }
}

/// One entry per loop pass. Appended-only within a run; never mutated
/// after append.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    /// 1-based iteration index.
    pub index: u32,
    /// The think step's reasoning text. Never empty.
    pub thinking: String,
    /// The think step's plan text. Never empty.
    pub plan: String,
    /// The execute step's human-readable result text.
    pub execution_result: String,
    /// The evaluate step's verdict.
    pub verdict: Verdict,
    /// The evaluate step's feedback text, carried into refinement.
    pub feedback: String,
    /// Wall-clock duration of this iteration.
    pub duration: Duration,
    /// When this iteration started.
    pub timestamp: std::time::SystemTime,
}

/// Terminal status of one complete agentic invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The evaluator confirmed success.
    Success,
    /// The iteration cap was reached without success.
    MaxIterations,
    /// The run failed unrecoverably.
    Failed,
    /// The run was cancelled.
    Cancelled,
}

/// The outcome of one complete agentic invocation.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The original task text.
    pub task: String,
    /// Terminal status.
    pub status: RunStatus,
    /// Ordered list of iteration records.
    pub iterations: Vec<IterationRecord>,
    /// Total wall-clock duration of the run.
    pub total_duration: Duration,
    /// The final result payload; present iff `status == Success`.
    pub final_result: Option<String>,
}

impl RunResult {
    /// Whether this run ended in success.
    pub fn success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
