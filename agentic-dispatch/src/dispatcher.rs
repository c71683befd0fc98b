//! The tool dispatcher: the single entry point for "run something useful
//! for this request".

use crate::config::DispatcherConfig;
use crate::context::{ToolContext, ToolResult};
use crate::error::DispatchError;
use crate::registry::DispatchRegistry;
use crate::tool::{parallel_safe, DispatchTool};
use std::sync::Arc;
use std::time::Instant;

/// The single entry point for "given a request, run something useful and
/// hand back a result".
pub struct Dispatcher {
    registry: DispatchRegistry,
    config: DispatcherConfig,
}

struct Scored {
    score: f64,
    tool: Arc<dyn DispatchTool>,
}

impl Dispatcher {
    /// Build a dispatcher over `registry`.
    pub fn new(registry: DispatchRegistry, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    /// Score every registered tool against `request`/`context` and keep
    /// those at or above the configured threshold.
    fn candidates(&self, request: &str, context: &ToolContext) -> Vec<Scored> {
        let mut scored: Vec<Scored> = self
            .registry
            .all()
            .map(|tool| Scored {
                score: tool.can_handle(request, context),
                tool: Arc::clone(tool),
            })
            .filter(|s| s.score >= self.config.score_threshold)
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tool.description().len().cmp(&b.tool.description().len()))
                .then_with(|| a.tool.name().cmp(b.tool.name()))
        });
        scored
    }

    /// Run `process_request` per the dispatcher's single-tool/coordinated
    /// path selection.
    #[tracing::instrument(skip(self, context), fields(request = %request))]
    pub async fn process_request(
        &self,
        request: &str,
        context: &ToolContext,
        coordination: bool,
    ) -> Result<ToolResult, DispatchError> {
        let candidates = self.candidates(request, context);
        if candidates.is_empty() {
            return Err(DispatchError::NoToolMatched);
        }

        let top_gap = if candidates.len() >= 2 {
            candidates[0].score - candidates[1].score
        } else {
            f64::INFINITY
        };

        let single_path = !coordination || candidates.len() == 1 || top_gap >= self.config.single_tool_score_gap;

        if single_path {
            let chosen = &candidates[0].tool;
            return self.execute_with_deadline(chosen, context).await;
        }

        self.coordinated(candidates, context).await
    }

    async fn execute_with_deadline(
        &self,
        tool: &Arc<dyn DispatchTool>,
        context: &ToolContext,
    ) -> Result<ToolResult, DispatchError> {
        execute_tool_with_deadline(self.config.tool_deadline, Arc::clone(tool), context.clone()).await
    }

    async fn coordinated(&self, candidates: Vec<Scored>, context: &ToolContext) -> Result<ToolResult, DispatchError> {
        let top: Vec<Scored> = candidates.into_iter().take(self.config.max_tools).collect();

        let mut parallel_group: Vec<&Scored> = Vec::new();
        let mut serial_group: Vec<&Scored> = Vec::new();
        for candidate in &top {
            let safe_with_all = parallel_group
                .iter()
                .all(|other| parallel_safe(candidate.tool.as_ref(), other.tool.as_ref()));
            if safe_with_all {
                parallel_group.push(candidate);
            } else {
                serial_group.push(candidate);
            }
        }

        let mut ordered_names: Vec<String> = Vec::new();
        let mut results: Vec<(String, Result<ToolResult, DispatchError>)> = Vec::new();

        let deadline = self.config.tool_deadline;
        let mut handles = Vec::with_capacity(parallel_group.len());
        for scored in &parallel_group {
            let tool = Arc::clone(&scored.tool);
            let name = tool.name().to_string();
            let owned_context = context.clone();
            handles.push((
                name,
                tokio::spawn(async move { execute_tool_with_deadline(deadline, tool, owned_context).await }),
            ));
        }
        for (name, handle) in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(DispatchError::ToolFailed(format!("tool panicked: {e}"))));
            ordered_names.push(name.clone());
            results.push((name, result));
        }

        for scored in &serial_group {
            let tool = &scored.tool;
            let result = self.execute_with_deadline(tool, context).await;
            if let Ok(tool_result) = &result {
                if let Some(data) = &tool_result.data {
                    context.shared_set(tool.name(), data.clone());
                }
            }
            ordered_names.push(tool.name().to_string());
            results.push((tool.name().to_string(), result));
        }

        let total = results.len();
        let mut failed = 0usize;
        let mut output_parts = Vec::new();
        let mut tool_results = serde_json::Map::new();
        let mut files_created = std::collections::HashSet::new();
        let mut files_modified = std::collections::HashSet::new();
        let mut tools_invoked = Vec::new();

        for name in &ordered_names {
            let (_, result) = results.iter().find(|(n, _)| n == name).expect("name indexed above");
            tools_invoked.push(name.clone());
            match result {
                Ok(tool_result) => {
                    output_parts.push(tool_result.coerce_message());
                    files_created.extend(tool_result.files_created.iter().cloned());
                    files_modified.extend(tool_result.files_modified.iter().cloned());
                    tool_results.insert(
                        name.clone(),
                        serde_json::json!({"success": tool_result.success, "message": tool_result.coerce_message()}),
                    );
                    if !tool_result.success {
                        failed += 1;
                    }
                }
                Err(e) => {
                    failed += 1;
                    output_parts.push(e.to_string());
                    tool_results.insert(name.clone(), serde_json::json!({"success": false, "message": e.to_string()}));
                }
            }
        }

        let mut data = serde_json::Map::new();
        data.insert(
            "coordination_result".to_string(),
            serde_json::json!({"tool_results": serde_json::Value::Object(tool_results)}),
        );

        Ok(ToolResult {
            success: failed == 0,
            output: Some(output_parts.join("\n")),
            data: Some(serde_json::Value::Object(data)),
            error: if failed == 0 {
                None
            } else {
                Some(format!("{failed} of {total} tools failed"))
            },
            files_created,
            files_modified,
            tools_invoked,
            elapsed: std::time::Duration::default(),
        })
    }
}

/// Run `tool` against `context`, enforcing `deadline` and converting an
/// elapsed timeout into [`DispatchError::Timeout`]. Free function (rather
/// than a `Dispatcher` method) so it can be spawned as an owned task for
/// the coordinated path's parallel group.
async fn execute_tool_with_deadline(
    deadline: std::time::Duration,
    tool: Arc<dyn DispatchTool>,
    context: ToolContext,
) -> Result<ToolResult, DispatchError> {
    let start = Instant::now();
    let result = tokio::time::timeout(deadline, tool.execute(&context)).await;
    match result {
        Ok(Ok(mut tool_result)) => {
            tool_result.elapsed = start.elapsed();
            Ok(tool_result)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            context.cancel.cancel();
            Err(DispatchError::Timeout(tool.name().to_string()))
        }
    }
}
