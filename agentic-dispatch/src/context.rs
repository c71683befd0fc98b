//! Shared context and uniform result type passed through tool execution.

use agentic_router::AskCapable;
use neuron_mcp::McpClient;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The uniform return of any tool execution.
///
/// Never partially populated: `success` iff `error` is `None`.
#[derive(Debug, Clone, Default)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Human-readable output, if any.
    pub output: Option<String>,
    /// Structured data, opaque to the dispatcher.
    pub data: Option<serde_json::Value>,
    /// Error message, present iff `success` is false.
    pub error: Option<String>,
    /// Files this execution created.
    pub files_created: HashSet<String>,
    /// Files this execution modified.
    pub files_modified: HashSet<String>,
    /// Tool names invoked, for coordinators reporting on sub-tools.
    pub tools_invoked: Vec<String>,
    /// Wall-clock duration of the execution.
    pub elapsed: Duration,
}

impl ToolResult {
    /// Build a successful result with just a human-readable message.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            ..Default::default()
        }
    }

    /// Build a failed result with an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Extract a human message from this result's structured data,
    /// preferring in order: `data.message`, `data.response`, `data.output`,
    /// `output`, else a generic "completed"/"failed" string.
    pub fn coerce_message(&self) -> String {
        if let Some(data) = &self.data {
            for field in ["message", "response", "output"] {
                if let Some(text) = data.get(field).and_then(|v| v.as_str()) {
                    return text.to_string();
                }
            }
        }
        if let Some(output) = &self.output {
            return output.clone();
        }
        if self.success {
            "completed".to_string()
        } else {
            self.error.clone().unwrap_or_else(|| "failed".to_string())
        }
    }
}

/// A cooperative cancellation signal checked at tool-execution boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    /// A signal that has not been tripped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The shared value passed into every tool execution. Created per turn;
/// not shared across turns.
#[derive(Clone)]
pub struct ToolContext {
    /// The free-form request text driving this execution.
    pub request: String,
    /// Current working path.
    pub cwd: PathBuf,
    /// Provider handle, for tools that themselves call the LLM.
    pub provider: Option<Arc<dyn AskCapable>>,
    /// MCP surface handle.
    pub mcp: Option<Arc<McpClient>>,
    /// Opaque shared state for intra-turn tool-to-tool communication.
    pub shared_state: Arc<Mutex<serde_json::Map<String, serde_json::Value>>>,
    /// Cooperative cancellation signal.
    pub cancel: CancelSignal,
}

impl ToolContext {
    /// Create a context for `request` rooted at `cwd`, with no provider or
    /// MCP surface attached.
    pub fn new(request: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            request: request.into(),
            cwd,
            provider: None,
            mcp: None,
            shared_state: Arc::new(Mutex::new(serde_json::Map::new())),
            cancel: CancelSignal::new(),
        }
    }

    /// Attach a provider handle.
    pub fn with_provider(mut self, provider: Arc<dyn AskCapable>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Attach an MCP client handle.
    pub fn with_mcp(mut self, mcp: Arc<McpClient>) -> Self {
        self.mcp = Some(mcp);
        self
    }

    /// Read a value a prior tool stashed under `key` in shared state.
    pub fn shared_get(&self, key: &str) -> Option<serde_json::Value> {
        self.shared_state.lock().expect("tool context poisoned").get(key).cloned()
    }

    /// Stash a value under `key` in shared state for downstream tools.
    pub fn shared_set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.shared_state
            .lock()
            .expect("tool context poisoned")
            .insert(key.into(), value);
    }
}
