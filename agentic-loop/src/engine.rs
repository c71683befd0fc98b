//! The agentic loop engine: think, execute, evaluate, refine.

use crate::config::LoopConfig;
use crate::error::LoopError;
use crate::parsing::{heuristic_evaluate, parse_evaluation, parse_think_response, refine_context};
use crate::types::{IterationRecord, Request, RunResult, RunStatus};
use agentic_dispatch::{CancelSignal, Dispatcher, ToolContext, ToolResult};
use agentic_events::{Event, EventSink};
use agentic_memory::{ContextUpdate, SessionMemory};
use agentic_router::{AskContext, ProviderRouter};
use crate::parsing::ThinkOutput;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Composes the provider router, tool dispatcher, and session memory into
/// the think -> execute -> evaluate -> refine state machine.
pub struct LoopEngine {
    session_id: String,
    router: Arc<ProviderRouter>,
    dispatcher: Arc<Dispatcher>,
    memory: Arc<SessionMemory>,
    sink: Arc<dyn EventSink>,
    config: LoopConfig,
    cwd: PathBuf,
}

impl LoopEngine {
    /// Build an engine for `session_id`, wiring in the shared router,
    /// dispatcher, session memory, and event sink.
    pub fn new(
        session_id: impl Into<String>,
        router: Arc<ProviderRouter>,
        dispatcher: Arc<Dispatcher>,
        memory: Arc<SessionMemory>,
        sink: Arc<dyn EventSink>,
        config: LoopConfig,
        cwd: PathBuf,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            router,
            dispatcher,
            memory,
            sink,
            config,
            cwd,
        }
    }

    /// Run one complete agentic invocation for `request`, cooperatively
    /// checking `cancel` between steps.
    #[tracing::instrument(skip(self, request, cancel), fields(session_id = %self.session_id))]
    pub async fn run(&self, request: Request, cancel: CancelSignal) -> RunResult {
        let started = Instant::now();
        let max_iterations = request.max_iterations.unwrap_or(self.config.max_iterations);

        if let Err(err) = self.memory.start(request.task.clone(), None, false).await {
            if !matches!(err, agentic_memory::MemoryError::AlreadyLive) {
                return self.failed(request.task, Vec::new(), started, LoopError::from(err));
            }
            tracing::debug!("continuing an already-live session context");
        }

        self.sink.emit(Event::TaskStarted {
            session_id: self.session_id.clone(),
            task: request.task.clone(),
        });

        let mut context_string = request.task.clone();
        let mut iterations: Vec<IterationRecord> = Vec::new();

        for iteration in 1..=max_iterations {
            if cancel.is_cancelled() {
                return self.cancelled(request.task, iterations, started);
            }

            self.sink.emit(Event::IterationStarted { iteration });
            let iteration_started = Instant::now();

            let think_output = match self.think(&context_string, iteration, max_iterations).await {
                Ok(text) => parse_think_response(&text),
                Err(err) => {
                    tracing::warn!(%err, iteration, "think step failed; treating as a failed iteration");
                    ThinkOutput {
                        thinking: format!("think step unavailable: {err}"),
                        plan: "no plan available; the think step timed out or failed".to_string(),
                    }
                }
            };
            self.sink.emit(Event::Thinking {
                text: think_output.thinking.clone(),
            });
            self.sink.emit(Event::Planning {
                text: think_output.plan.clone(),
            });

            if cancel.is_cancelled() {
                return self.cancelled(request.task, iterations, started);
            }

            self.sink.emit(Event::ExecutionStarted {
                plan: think_output.plan.clone(),
            });
            let tool_result = self.execute(&think_output.plan, &request, cancel.clone()).await;
            let execution_result = tool_result.coerce_message();
            self.sink.emit(Event::ExecutionCompleted {
                result: execution_result.clone(),
            });

            if cancel.is_cancelled() {
                return self.cancelled(request.task, iterations, started);
            }

            let outcome = self.evaluate(&request.task, &think_output.plan, &execution_result).await;
            self.sink.emit(Event::EvaluationCompleted {
                verdict: outcome.verdict.clone(),
                feedback: outcome.feedback.clone(),
            });

            let duration = iteration_started.elapsed();
            self.memory
                .update(ContextUpdate {
                    iteration: Some(iteration),
                    last_result: Some(execution_result.clone()),
                    last_evaluation: Some(outcome.verdict.reasoning.clone()),
                    new_completed: if outcome.verdict.succeeded {
                        vec![think_output.plan.clone()]
                    } else {
                        Vec::new()
                    },
                    new_pending: if outcome.verdict.succeeded {
                        Vec::new()
                    } else {
                        vec![think_output.plan.clone()]
                    },
                    files_created: tool_result.files_created.iter().cloned().collect(),
                    files_modified: tool_result.files_modified.iter().cloned().collect(),
                    tools_used: tool_result.tools_invoked.clone(),
                })
                .await
                .ok();

            iterations.push(IterationRecord {
                index: iteration,
                thinking: think_output.thinking,
                plan: think_output.plan,
                execution_result: execution_result.clone(),
                verdict: outcome.verdict.clone(),
                feedback: outcome.feedback.clone(),
                duration,
                timestamp: std::time::SystemTime::now(),
            });

            self.sink.emit(Event::IterationCompleted {
                iteration,
                duration_ms: duration.as_millis() as u64,
            });

            if outcome.verdict.succeeded {
                self.memory.complete(Some(execution_result.clone())).ok();
                self.sink.emit(Event::TaskSucceeded {
                    result: execution_result.clone(),
                });
                return RunResult {
                    task: request.task,
                    status: RunStatus::Success,
                    iterations,
                    total_duration: started.elapsed(),
                    final_result: Some(execution_result),
                };
            }

            context_string = refine_context(
                &context_string,
                &outcome.feedback,
                iteration,
                self.config.alternative_approach_threshold,
            );
        }

        let last_result = iterations.last().map(|r| r.execution_result.clone());
        self.sink.emit(Event::TaskMaxIterations {
            last_result: last_result.clone(),
        });
        RunResult {
            task: request.task,
            status: RunStatus::MaxIterations,
            iterations,
            total_duration: started.elapsed(),
            final_result: last_result,
        }
    }

    async fn think(&self, context_string: &str, iteration: u32, max_iterations: u32) -> Result<String, LoopError> {
        let prompt = format!(
            "{}\nTask context: {}\nIteration: {} of {}\nRespond in the form:\nTHINKING: <reasoning>\nPLAN: <one concrete next step>",
            self.config.system_prompt, context_string, iteration, max_iterations
        );
        let ask_context = AskContext::default();
        let ask = self.router.ask_via(None, &prompt, &[], &ask_context, None);
        tokio::time::timeout(self.config.think_deadline, ask)
            .await
            .map_err(|_| LoopError::ProviderUnavailable("think step timed out".to_string()))?
            .map_err(LoopError::from)
    }

    async fn execute(&self, plan: &str, request: &Request, cancel: CancelSignal) -> ToolResult {
        let mut context = ToolContext::new(plan, self.cwd.clone());
        context.cancel = cancel;
        if let Some(allowlist) = &request.tools_allowlist {
            context.shared_set("tools_allowlist", serde_json::json!(allowlist));
        }
        let dispatch = self.dispatcher.process_request(plan, &context, true);
        match tokio::time::timeout(self.config.execute_deadline, dispatch).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => ToolResult::failure(format!("error: {err}")),
            Err(_) => ToolResult::failure("execute step timed out"),
        }
    }

    async fn evaluate(&self, task: &str, plan: &str, execution_result: &str) -> crate::parsing::EvaluationOutcome {
        let prompt = format!(
            "{}\nOriginal task: {task}\nPlan attempted: {plan}\nExecution result: {execution_result}\n\
             Respond in the form:\nSUCCESS: <true|false>\nCONFIDENCE: <0.0-1.0>\nREASONING: <why>\nFEEDBACK: <what to try next if not successful>",
            self.config.system_prompt
        );
        let ask_context = AskContext::default();
        let ask = self.router.ask_via(None, &prompt, &[], &ask_context, None);
        match tokio::time::timeout(self.config.evaluate_deadline, ask).await {
            Ok(Ok(response)) => parse_evaluation(&response, task, execution_result),
            _ => heuristic_evaluate(task, execution_result),
        }
    }

    fn failed(
        &self,
        task: String,
        iterations: Vec<IterationRecord>,
        started: Instant,
        error: LoopError,
    ) -> RunResult {
        self.sink.emit(Event::TaskFailed {
            error: error.to_string(),
        });
        RunResult {
            task,
            status: RunStatus::Failed,
            iterations,
            total_duration: started.elapsed(),
            final_result: None,
        }
    }

    fn cancelled(&self, task: String, iterations: Vec<IterationRecord>, started: Instant) -> RunResult {
        self.sink.emit(Event::TaskCancelled {
            iterations_completed: iterations.len() as u32,
        });
        RunResult {
            task,
            status: RunStatus::Cancelled,
            iterations,
            total_duration: started.elapsed(),
            final_result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_dispatch::{DispatchError, DispatchRegistry, DispatcherConfig, DispatchTool, ToolResult};
    use agentic_events::RecordingEventSink;
    use agentic_memory::MemoryConfig;
    use agentic_router::{AskCapable, ModelDescriptor, ProviderDescriptor, RouterConfig, RouterError};
    use async_trait::async_trait;
    use neuron_turn::ProviderMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        name: String,
        responses: std::sync::Mutex<std::collections::VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &str, responses: Vec<&str>) -> Self {
            Self {
                name: name.to_string(),
                responses: std::sync::Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AskCapable for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn ask(
            &self,
            _prompt: &str,
            _history: &[ProviderMessage],
            _system: Option<&str>,
            _model: Option<&str>,
        ) -> Result<String, RouterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut guard = self.responses.lock().unwrap();
            guard
                .pop_front()
                .ok_or_else(|| RouterError::UnknownProvider("script exhausted".to_string()))
        }

        fn is_available(&self) -> bool {
            true
        }

        fn list_models(&self) -> Vec<ModelDescriptor> {
            vec![]
        }

        fn system_prompt(&self) -> Option<String> {
            None
        }

        fn descriptor(&self) -> &ProviderDescriptor {
            static DESC: std::sync::OnceLock<ProviderDescriptor> = std::sync::OnceLock::new();
            DESC.get_or_init(|| ProviderDescriptor::new("stub", 0))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl DispatchTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes the plan"
        }
        fn category(&self) -> &str {
            "test"
        }
        fn capability_set(&self) -> &[String] {
            &[]
        }
        fn mutates(&self) -> &[String] {
            &[]
        }
        fn can_handle(&self, _request: &str, _context: &ToolContext) -> f64 {
            0.9
        }
        async fn execute(&self, context: &ToolContext) -> Result<ToolResult, DispatchError> {
            Ok(ToolResult::success(format!("executed: {}", context.request)))
        }
    }

    struct FileWritingTool;

    #[async_trait]
    impl DispatchTool for FileWritingTool {
        fn name(&self) -> &str {
            "write_file"
        }
        fn description(&self) -> &str {
            "writes a file to disk"
        }
        fn category(&self) -> &str {
            "fs"
        }
        fn capability_set(&self) -> &[String] {
            &[]
        }
        fn mutates(&self) -> &[String] {
            &[]
        }
        fn can_handle(&self, _request: &str, _context: &ToolContext) -> f64 {
            0.9
        }
        async fn execute(&self, _context: &ToolContext) -> Result<ToolResult, DispatchError> {
            let mut result = ToolResult::success("wrote calculator.py");
            result.files_created.insert("calculator.py".to_string());
            result.tools_invoked.push("write_file".to_string());
            Ok(result)
        }
    }

    fn harness(
        provider_responses: Vec<&str>,
    ) -> (LoopEngine, Arc<RecordingEventSink>, Arc<SessionMemory>, tempfile::TempDir) {
        harness_with_tool(provider_responses, Arc::new(EchoTool))
    }

    fn harness_with_tool(
        provider_responses: Vec<&str>,
        tool: Arc<dyn DispatchTool>,
    ) -> (LoopEngine, Arc<RecordingEventSink>, Arc<SessionMemory>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let router = Arc::new(ProviderRouter::new(RouterConfig::default()));
        router.register(Arc::new(ScriptedProvider::new("stub", provider_responses)));

        let registry = DispatchRegistry::new(vec![tool]);
        let dispatcher = Arc::new(Dispatcher::new(registry, DispatcherConfig::default()));

        let memory_config = MemoryConfig {
            idle_threshold: std::time::Duration::from_secs(1800),
            archive_dir: dir.path().join("archive"),
            snapshot_dir: dir.path().join("snapshots"),
        };
        let memory = Arc::new(SessionMemory::new("s1", memory_config));

        let sink = Arc::new(RecordingEventSink::new());
        let engine = LoopEngine::new(
            "s1",
            router,
            dispatcher,
            Arc::clone(&memory),
            Arc::clone(&sink) as Arc<dyn EventSink>,
            LoopConfig::default(),
            dir.path().to_path_buf(),
        );
        (engine, sink, memory, dir)
    }

    #[tokio::test]
    async fn happy_path_single_iteration_succeeds() {
        let (engine, sink, _memory, _dir) = harness(vec![
            "THINKING: write the file\nPLAN: write hello.txt",
            "SUCCESS: true\nCONFIDENCE: 0.9\nREASONING: done\nFEEDBACK: none",
        ]);
        let result = engine.run(Request::new("write hello.txt"), CancelSignal::new()).await;
        assert!(result.success());
        assert_eq!(result.iterations.len(), 1);
        let events = sink.drain();
        assert!(events.iter().any(|e| matches!(e, Event::TaskSucceeded { .. })));
    }

    #[tokio::test]
    async fn refinement_over_two_iterations_then_succeeds() {
        let (engine, _sink, _memory, _dir) = harness(vec![
            "THINKING: first attempt\nPLAN: try approach A",
            "SUCCESS: false\nCONFIDENCE: 0.4\nREASONING: incomplete\nFEEDBACK: try approach B",
            "THINKING: second attempt\nPLAN: try approach B",
            "SUCCESS: true\nCONFIDENCE: 0.9\nREASONING: done\nFEEDBACK: none",
        ]);
        let result = engine.run(Request::new("solve the task"), CancelSignal::new()).await;
        assert!(result.success());
        assert_eq!(result.iterations.len(), 2);
        assert!(!result.iterations[0].verdict.succeeded);
        assert!(result.iterations[1].verdict.succeeded);
    }

    #[tokio::test]
    async fn cap_reached_without_success() {
        let mut responses = Vec::new();
        for _ in 0..3 {
            responses.push("THINKING: trying\nPLAN: do the thing");
            responses.push("SUCCESS: false\nCONFIDENCE: 0.2\nREASONING: no\nFEEDBACK: keep trying");
        }
        let (engine, _sink, _memory, _dir) = harness(responses);
        let mut request = Request::new("impossible task");
        request.max_iterations = Some(3);
        let result = engine.run(request, CancelSignal::new()).await;
        assert_eq!(result.status, RunStatus::MaxIterations);
        assert_eq!(result.iterations.len(), 3);
    }

    #[tokio::test]
    async fn provider_outage_falls_back_to_heuristic_evaluation() {
        let (engine, _sink, _memory, _dir) = harness(vec!["THINKING: t\nPLAN: write report.txt"]);
        let result = engine.run(Request::new("write report.txt"), CancelSignal::new()).await;
        assert_eq!(result.iterations.len(), 1);
        assert!(result.iterations[0].verdict.succeeded);
    }

    #[tokio::test]
    async fn think_timeout_is_treated_as_a_failed_iteration_not_a_task_failure() {
        let (engine, _sink, _memory, _dir) = harness(vec![]);
        let mut request = Request::new("write hello.txt");
        request.max_iterations = Some(1);
        let result = engine.run(request, CancelSignal::new()).await;
        assert_eq!(result.status, RunStatus::MaxIterations);
        assert_eq!(result.iterations.len(), 1);
        assert!(!result.iterations[0].verdict.succeeded);
    }

    #[tokio::test]
    async fn execute_result_populates_context_update_files_and_tools() {
        let (engine, _sink, memory, _dir) = harness_with_tool(
            vec![
                "THINKING: write the file\nPLAN: write calculator.py",
                "SUCCESS: false\nCONFIDENCE: 0.4\nREASONING: not yet\nFEEDBACK: keep going",
            ],
            Arc::new(FileWritingTool),
        );
        let mut request = Request::new("write calculator.py");
        request.max_iterations = Some(1);
        let result = engine.run(request, CancelSignal::new()).await;
        assert_eq!(result.status, RunStatus::MaxIterations);
        let live = memory.live_context().expect("context still live after an unsuccessful run");
        assert!(live.files_created.contains("calculator.py"));
        assert_eq!(live.tools_used.get("write_file").copied(), Some(1));
    }

    #[tokio::test]
    async fn cancellation_between_iterations_stops_the_run() {
        let (engine, _sink, _memory, _dir) = harness(vec![
            "THINKING: t\nPLAN: write a.txt",
            "SUCCESS: false\nCONFIDENCE: 0.1\nREASONING: no\nFEEDBACK: again",
        ]);
        let cancel = CancelSignal::new();
        cancel.cancel();
        let result = engine.run(Request::new("write a.txt"), cancel).await;
        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(result.iterations.is_empty());
    }
}
