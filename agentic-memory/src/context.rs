//! `AgenticContext`: the durable per-session state that makes the system
//! "remember" across turns.

use crate::keywords::extract_keywords;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The durable per-session state tracked by [`crate::SessionMemory`].
///
/// A step appears in exactly one of `completed_steps`/`pending_steps` at a
/// time; `iteration_count` is monotone non-decreasing; `context_keywords`
/// always contains at least the keywords of `original_task`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticContext {
    /// Session this context belongs to.
    pub session_id: String,
    /// The task text as originally given, set once at start.
    pub original_task: String,
    /// The current objective, which may be refined each iteration.
    pub current_objective: String,
    /// Plan steps that have completed, in order.
    pub completed_steps: Vec<String>,
    /// Plan steps not yet completed, in order.
    pub pending_steps: Vec<String>,
    /// Number of loop iterations recorded against this context so far.
    pub iteration_count: u32,
    /// The most recent execution result text, if any.
    pub last_result: Option<String>,
    /// The most recent evaluation verdict/message, if any.
    pub last_evaluation: Option<String>,
    /// Domain tokens seen so far, grown monotonically.
    pub context_keywords: HashSet<String>,
    /// Files created so far, grown monotonically.
    pub files_created: HashSet<String>,
    /// Files modified so far, grown monotonically.
    pub files_modified: HashSet<String>,
    /// Tool invocation counts, grown monotonically.
    pub tools_used: std::collections::HashMap<String, u32>,
    /// When this context was created.
    pub started_at: DateTime<Utc>,
    /// Last time this context was touched.
    pub last_activity: DateTime<Utc>,
    /// Set by [`crate::SessionMemory::complete`]; the task is terminal.
    pub completed: bool,
    /// Set by [`crate::SessionMemory::pause`]/`resume`.
    pub paused: bool,
}

impl AgenticContext {
    /// Create a fresh context for `session_id` starting on `task`, with an
    /// optional distinct initial objective (defaults to `task` itself).
    pub fn new(session_id: impl Into<String>, task: impl Into<String>, initial_objective: Option<String>) -> Self {
        let task = task.into();
        let now = Utc::now();
        let mut context_keywords = extract_keywords(&task);
        let objective = initial_objective.unwrap_or_else(|| task.clone());
        context_keywords.extend(extract_keywords(&objective));
        Self {
            session_id: session_id.into(),
            current_objective: objective,
            original_task: task,
            completed_steps: Vec::new(),
            pending_steps: Vec::new(),
            iteration_count: 0,
            last_result: None,
            last_evaluation: None,
            context_keywords,
            files_created: HashSet::new(),
            files_modified: HashSet::new(),
            tools_used: std::collections::HashMap::new(),
            started_at: now,
            last_activity: now,
            completed: false,
            paused: false,
        }
    }

    /// Whether this context hasn't been touched within `idle_threshold`.
    pub fn is_stale(&self, idle_threshold: std::time::Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.last_activity);
        age.to_std().map(|a| a > idle_threshold).unwrap_or(false)
    }

    /// `|pending| == 0 && |completed| > 0 && last_evaluation` mentions
    /// success (case-insensitive).
    pub fn looks_task_complete(&self) -> bool {
        self.pending_steps.is_empty()
            && !self.completed_steps.is_empty()
            && self
                .last_evaluation
                .as_deref()
                .map(|e| e.to_lowercase().contains("success"))
                .unwrap_or(false)
    }
}
