//! The dispatcher's extension of the workspace's object-safe tool trait.

use crate::context::{ToolContext, ToolResult};
use crate::error::DispatchError;
use async_trait::async_trait;
use std::collections::HashSet;

/// Extends [`neuron_tool::ToolDyn`]'s `name`/`description`/`input_schema`/
/// `call` surface with the scoring and categorisation the dispatcher needs.
///
/// `can_handle` must be pure, fast, and must not mutate `context`.
/// `execute` may be long-running, may suspend, must respect
/// `context.cancel`, and must return within the caller-provided deadline.
#[async_trait]
pub trait DispatchTool: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Broad grouping used for indexing and display (e.g. `filesystem`,
    /// `search`, `code`).
    fn category(&self) -> &str;

    /// Capability tags this tool advertises (e.g. `read`, `search`,
    /// `write`).
    fn capability_set(&self) -> &[String];

    /// Capability tags this tool may mutate when it runs. Used to decide
    /// whether two tools are safe to run in parallel.
    fn mutates(&self) -> &[String];

    /// Confidence in `[0, 1]` that this tool can usefully handle
    /// `request`. Pure, fast, must not mutate `context`.
    fn can_handle(&self, request: &str, context: &ToolContext) -> f64;

    /// Execute against `context`, producing a [`ToolResult`].
    async fn execute(&self, context: &ToolContext) -> Result<ToolResult, DispatchError>;
}

/// Whether `a` and `b` are safe to run concurrently: neither's `mutates`
/// intersects the other's `capability_set`.
pub fn parallel_safe(a: &dyn DispatchTool, b: &dyn DispatchTool) -> bool {
    let a_caps: HashSet<&str> = a.capability_set().iter().map(String::as_str).collect();
    let b_caps: HashSet<&str> = b.capability_set().iter().map(String::as_str).collect();
    let a_mutates: HashSet<&str> = a.mutates().iter().map(String::as_str).collect();
    let b_mutates: HashSet<&str> = b.mutates().iter().map(String::as_str).collect();

    a_mutates.is_disjoint(&b_caps) && b_mutates.is_disjoint(&a_caps) && a_mutates.is_disjoint(&b_mutates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn dispatch_tool_is_object_safe() {
        _assert_send_sync::<Arc<dyn DispatchTool>>();
    }

    struct Stub {
        caps: Vec<String>,
        mutates: Vec<String>,
    }

    #[async_trait]
    impl DispatchTool for Stub {
        fn name(&self) -> &str {
            "stub"
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn category(&self) -> &str {
            "test"
        }
        fn capability_set(&self) -> &[String] {
            &self.caps
        }
        fn mutates(&self) -> &[String] {
            &self.mutates
        }
        fn can_handle(&self, _request: &str, _context: &ToolContext) -> f64 {
            0.5
        }
        async fn execute(&self, _context: &ToolContext) -> Result<ToolResult, DispatchError> {
            Ok(ToolResult::success("ok"))
        }
    }

    #[test]
    fn disjoint_mutates_and_capabilities_are_parallel_safe() {
        let a = Stub {
            caps: vec!["search".into()],
            mutates: vec![],
        };
        let b = Stub {
            caps: vec!["read".into()],
            mutates: vec![],
        };
        assert!(parallel_safe(&a, &b));
    }

    #[test]
    fn mutating_overlap_is_not_parallel_safe() {
        let a = Stub {
            caps: vec!["filesystem".into()],
            mutates: vec!["filesystem".into()],
        };
        let b = Stub {
            caps: vec!["filesystem".into()],
            mutates: vec![],
        };
        assert!(!parallel_safe(&a, &b));
    }
}
