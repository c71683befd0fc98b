//! `SessionMemory`: holds at most one live [`AgenticContext`] per session
//! and decides whether a new request continues it.

use crate::config::MemoryConfig;
use crate::context::AgenticContext;
use crate::error::MemoryError;
use crate::keywords::{extract_keywords, is_generic, CONTINUATION_TOKENS};
use crate::persistence::{archive_filename, read_durable, snapshot_filename, write_durable};
use chrono::Utc;
use std::sync::RwLock;

/// Update fields for [`SessionMemory::update`]; all optional, all
/// monotone-merged into the live context.
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    /// Iteration number this update corresponds to.
    pub iteration: Option<u32>,
    /// Latest execution result text.
    pub last_result: Option<String>,
    /// Latest evaluation verdict/message.
    pub last_evaluation: Option<String>,
    /// Plan steps that newly completed this iteration.
    pub new_completed: Vec<String>,
    /// Plan steps newly discovered/pending this iteration.
    pub new_pending: Vec<String>,
    /// Files created this iteration.
    pub files_created: Vec<String>,
    /// Files modified this iteration.
    pub files_modified: Vec<String>,
    /// Tool names invoked this iteration.
    pub tools_used: Vec<String>,
}

/// Holds at most one live [`AgenticContext`] for a single session, with
/// durable snapshot/archival hooked to specific mutation events.
pub struct SessionMemory {
    session_id: String,
    config: MemoryConfig,
    live: RwLock<Option<AgenticContext>>,
}

impl SessionMemory {
    /// Create session memory for `session_id`; no context is live yet.
    pub fn new(session_id: impl Into<String>, config: MemoryConfig) -> Self {
        Self {
            session_id: session_id.into(),
            config,
            live: RwLock::new(None),
        }
    }

    /// The directory archived contexts are written under.
    pub fn archive_dir(&self) -> &std::path::Path {
        &self.config.archive_dir
    }

    /// Create a fresh context. Fails if one is already live; call `end()`
    /// or pass `replace = true` to archive-then-start.
    pub async fn start(
        &self,
        task: impl Into<String>,
        initial_objective: Option<String>,
        replace: bool,
    ) -> Result<(), MemoryError> {
        {
            let existing = self.live.read().expect("session memory poisoned");
            if existing.is_some() && !replace {
                return Err(MemoryError::AlreadyLive);
            }
        }
        if replace {
            self.end().await.ok();
        }
        let context = AgenticContext::new(self.session_id.clone(), task, initial_objective);
        self.snapshot(&context).await?;
        *self.live.write().expect("session memory poisoned") = Some(context);
        tracing::info!(session_id = %self.session_id, "session memory started");
        Ok(())
    }

    /// Monotone merge of new iteration data into the live context, then a
    /// write-through snapshot.
    pub async fn update(&self, patch: ContextUpdate) -> Result<(), MemoryError> {
        let snapshot = {
            let mut guard = self.live.write().expect("session memory poisoned");
            let context = guard.as_mut().ok_or(MemoryError::NoActiveContext)?;

            if let Some(iteration) = patch.iteration {
                context.iteration_count = context.iteration_count.max(iteration);
            }
            if let Some(result) = patch.last_result {
                context.last_result = Some(result);
            }
            if let Some(eval) = patch.last_evaluation {
                context.last_evaluation = Some(eval);
            }
            for step in patch.new_completed {
                context.pending_steps.retain(|s| s != &step);
                if !context.completed_steps.contains(&step) {
                    context.completed_steps.push(step.clone());
                }
                context.context_keywords.extend(extract_keywords(&step));
            }
            for step in patch.new_pending {
                if !context.completed_steps.contains(&step) && !context.pending_steps.contains(&step) {
                    context.pending_steps.push(step.clone());
                }
                context.context_keywords.extend(extract_keywords(&step));
            }
            for file in patch.files_created {
                context.context_keywords.extend(extract_keywords(&file));
                context.files_created.insert(file);
            }
            for file in patch.files_modified {
                context.context_keywords.extend(extract_keywords(&file));
                context.files_modified.insert(file);
            }
            for tool in patch.tools_used {
                *context.tools_used.entry(tool).or_insert(0) += 1;
            }
            context.last_activity = Utc::now();
            context.clone()
        };
        self.snapshot(&snapshot).await
    }

    /// A clone of the live context, if one exists. Used by callers (e.g.
    /// the orchestrator) that need to read `current_objective` or other
    /// fields without holding the internal lock.
    pub fn live_context(&self) -> Option<AgenticContext> {
        self.live.read().expect("session memory poisoned").clone()
    }

    /// Decide whether `request` continues the active context.
    pub fn is_related(&self, request: &str) -> bool {
        let guard = self.live.read().expect("session memory poisoned");
        let Some(context) = guard.as_ref() else {
            return false;
        };
        let lower = request.to_lowercase();

        if CONTINUATION_TOKENS.iter().any(|t| lower.contains(t)) {
            return true;
        }

        let request_keywords = extract_keywords(request);
        let overlap: Vec<&String> = request_keywords.intersection(&context.context_keywords).collect();

        let has_specific = overlap.iter().any(|k| !is_generic(k));
        let mentions_created_file = context
            .files_created
            .iter()
            .any(|f| request.contains(f.as_str()));
        if has_specific || mentions_created_file {
            return true;
        }

        if overlap.len() >= 2 {
            return true;
        }

        if !overlap.is_empty() {
            let has_domain_phrase = context
                .context_keywords
                .iter()
                .any(|k| !is_generic(k) && lower.contains(&format!("the {k}")));
            if has_domain_phrase {
                return true;
            }
            return false;
        }

        if context
            .files_created
            .union(&context.files_modified)
            .any(|f| request.contains(f.as_str()))
        {
            return true;
        }

        if context.tools_used.keys().any(|t| request.contains(t.as_str())) {
            return true;
        }

        false
    }

    /// True iff `is_related(request)`, or a live context exists that is
    /// not stale, not complete, and still has pending steps.
    pub fn should_continue(&self, request: &str) -> bool {
        if self.is_related(request) {
            return true;
        }
        let guard = self.live.read().expect("session memory poisoned");
        match guard.as_ref() {
            Some(context) => {
                !context.is_stale(self.config.idle_threshold)
                    && !context.completed
                    && !context.pending_steps.is_empty()
            }
            None => false,
        }
    }

    /// Mark the live context terminal.
    pub fn complete(&self, final_result: Option<String>) -> Result<(), MemoryError> {
        let mut guard = self.live.write().expect("session memory poisoned");
        let context = guard.as_mut().ok_or(MemoryError::NoActiveContext)?;
        context.completed = true;
        if let Some(result) = final_result {
            context.last_result = Some(result);
        }
        context.last_activity = Utc::now();
        Ok(())
    }

    /// Toggle the in-memory paused flag. Does not archive.
    pub fn pause(&self) -> Result<(), MemoryError> {
        let mut guard = self.live.write().expect("session memory poisoned");
        let context = guard.as_mut().ok_or(MemoryError::NoActiveContext)?;
        context.paused = true;
        Ok(())
    }

    /// Clear the paused flag.
    pub fn resume(&self) -> Result<(), MemoryError> {
        let mut guard = self.live.write().expect("session memory poisoned");
        let context = guard.as_mut().ok_or(MemoryError::NoActiveContext)?;
        context.paused = false;
        Ok(())
    }

    /// Whether the live context is currently paused.
    pub fn is_paused(&self) -> bool {
        self.live
            .read()
            .expect("session memory poisoned")
            .as_ref()
            .map(|c| c.paused)
            .unwrap_or(false)
    }

    /// Archive the live context to durable storage and clear live state.
    pub async fn end(&self) -> Result<(), MemoryError> {
        let context = {
            let mut guard = self.live.write().expect("session memory poisoned");
            guard.take()
        };
        let Some(context) = context else {
            return Err(MemoryError::NoActiveContext);
        };
        let filename = archive_filename(&self.session_id, Utc::now().timestamp_millis());
        write_durable(&self.config.archive_dir, &filename, &context).await?;
        tracing::info!(session_id = %self.session_id, "session memory archived");
        Ok(())
    }

    /// Write the live context's current state to disk without clearing
    /// live state, via temp-file-plus-rename.
    async fn snapshot(&self, context: &AgenticContext) -> Result<(), MemoryError> {
        write_durable(&self.config.snapshot_dir, &snapshot_filename(&self.session_id), context)
            .await
            .map(|_| ())
    }

    /// Restore a context previously snapshotted for `session_id`, if any.
    pub async fn load(session_id: &str, config: MemoryConfig) -> Result<Self, MemoryError> {
        let path = config.snapshot_dir.join(snapshot_filename(session_id));
        let memory = Self::new(session_id, config);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let context = read_durable(&path).await?;
            *memory.live.write().expect("session memory poisoned") = Some(context);
        }
        Ok(memory)
    }
}
