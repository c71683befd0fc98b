//! Per-turn entry point: decides whether a turn continues an existing
//! agentic run, starts a new one, or is handled directly by the tool
//! dispatcher, then wires the chosen path to the event sink.

use agentic_dispatch::{CancelSignal, Dispatcher, DispatchError, ToolContext, ToolResult};
use agentic_events::{Event, EventSink};
use agentic_loop::{LoopEngine, Request, RunResult};
use agentic_memory::SessionMemory;
use std::path::PathBuf;
use std::sync::Arc;

const SYSTEMIC_VERBS: &[&str] = &[
    "analyze",
    "systematically",
    "comprehensive",
    "figure out",
    "step by step",
    "debug",
    "refactor",
    "plan",
];

const MULTI_CLAUSE_MARKERS: &[&str] = &[" and then ", " then ", "; ", " after which "];

/// The outcome of one turn: either a full agentic run, or a single
/// dispatcher call for turns classified (or continued) as direct.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The turn was handled by the Loop Engine.
    Agentic(RunResult),
    /// The turn was handled directly by the Tool Dispatcher.
    Direct(Result<ToolResult, DispatchError>),
}

/// Decide whether `request` looks like it needs multi-step agentic
/// handling: more than ten words, a systemic verb, or multiple
/// conjoined clauses. Short, single-action lookups (`list files`) fall
/// through as direct.
pub fn classify_agentic(request: &str) -> bool {
    let word_count = request.split_whitespace().count();
    if word_count > 10 {
        return true;
    }
    let lower = request.to_lowercase();
    if SYSTEMIC_VERBS.iter().any(|v| lower.contains(v)) {
        return true;
    }
    is_multi_clause(&lower)
}

fn is_multi_clause(lower: &str) -> bool {
    if MULTI_CLAUSE_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }
    let parts: Vec<&str> = lower.split(" and ").collect();
    parts.len() >= 2 && parts.iter().all(|p| p.split_whitespace().count() >= 2)
}

/// Sits in front of the Loop Engine and Tool Dispatcher, choosing which
/// handles a given turn.
pub struct Orchestrator {
    memory: Arc<SessionMemory>,
    engine: Arc<LoopEngine>,
    dispatcher: Arc<Dispatcher>,
    sink: Arc<dyn EventSink>,
    cwd: PathBuf,
}

impl Orchestrator {
    /// Compose an orchestrator from the agentic execution core's parts.
    pub fn new(
        memory: Arc<SessionMemory>,
        engine: Arc<LoopEngine>,
        dispatcher: Arc<Dispatcher>,
        sink: Arc<dyn EventSink>,
        cwd: PathBuf,
    ) -> Self {
        Self {
            memory,
            engine,
            dispatcher,
            sink,
            cwd,
        }
    }

    /// Handle one turn: consult Session Memory for continuation, else
    /// classify the request as agentic or direct, then delegate.
    pub async fn handle_turn(&self, session_id: &str, request: &str) -> TurnOutcome {
        if self.memory.should_continue(request) {
            let objective = match self.memory.live_context() {
                Some(ctx) => format!("{} | continuing: {request}", ctx.current_objective),
                None => request.to_string(),
            };
            return TurnOutcome::Agentic(self.run_agentic(objective).await);
        }

        if classify_agentic(request) {
            TurnOutcome::Agentic(self.run_agentic(request.to_string()).await)
        } else {
            TurnOutcome::Direct(self.run_direct(session_id, request).await)
        }
    }

    async fn run_agentic(&self, task: String) -> RunResult {
        self.engine.run(Request::new(task), CancelSignal::new()).await
    }

    async fn run_direct(&self, session_id: &str, request: &str) -> Result<ToolResult, DispatchError> {
        self.sink.emit(Event::TaskStarted {
            session_id: session_id.to_string(),
            task: request.to_string(),
        });
        let context = ToolContext::new(request, self.cwd.clone());
        let result = self.dispatcher.process_request(request, &context, true).await;
        match &result {
            Ok(tool_result) => self.sink.emit(Event::TaskSucceeded {
                result: tool_result.coerce_message(),
            }),
            Err(err) => self.sink.emit(Event::TaskFailed {
                error: err.to_string(),
            }),
        }
        result
    }
}
