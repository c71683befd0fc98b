//! Construction-time configuration for the tool dispatcher.

use std::time::Duration;

/// Minimum `can_handle` score (inclusive) a tool must reach to be a
/// candidate at all.
pub const SCORE_THRESHOLD: f64 = 0.3;

/// Static configuration for a [`crate::Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Minimum `can_handle` score (inclusive) a tool must reach to be a
    /// candidate.
    pub score_threshold: f64,
    /// Maximum number of tools considered in the coordinated path.
    pub max_tools: usize,
    /// Per-tool execution deadline.
    pub tool_deadline: Duration,
    /// Score gap above which the single-tool path is taken even with
    /// multiple candidates.
    pub single_tool_score_gap: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            score_threshold: SCORE_THRESHOLD,
            max_tools: 3,
            tool_deadline: Duration::from_secs(30),
            single_tool_score_gap: 0.25,
        }
    }
}
