//! Tool registry indexed by name, category, and capability tag.
//!
//! Discovers tools at construction time from a caller-supplied list
//! (static registration, not runtime reflection). Read-only after
//! initialisation.

use crate::tool::DispatchTool;
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregate counts returned by [`DispatchRegistry::stats`].
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Total tools registered.
    pub count: usize,
    /// Distinct categories represented.
    pub categories: usize,
    /// Distinct capability tags represented.
    pub capabilities: usize,
}

/// Read-only-after-construction index over a set of [`DispatchTool`]s.
pub struct DispatchRegistry {
    by_name: HashMap<String, Arc<dyn DispatchTool>>,
    by_category: HashMap<String, Vec<Arc<dyn DispatchTool>>>,
    by_capability: HashMap<String, Vec<Arc<dyn DispatchTool>>>,
}

impl DispatchRegistry {
    /// Build the registry from `tools`, discovered by the caller at
    /// startup. Duplicate names replace the prior entry and log a warning.
    pub fn new(tools: Vec<Arc<dyn DispatchTool>>) -> Self {
        let mut by_name: HashMap<String, Arc<dyn DispatchTool>> = HashMap::new();
        let mut by_category: HashMap<String, Vec<Arc<dyn DispatchTool>>> = HashMap::new();
        let mut by_capability: HashMap<String, Vec<Arc<dyn DispatchTool>>> = HashMap::new();

        for tool in tools {
            let name = tool.name().to_string();
            if by_name.contains_key(&name) {
                tracing::warn!(tool_name = %name, "duplicate tool registration, replacing prior entry");
            }
            by_category
                .entry(tool.category().to_string())
                .or_default()
                .push(Arc::clone(&tool));
            for cap in tool.capability_set() {
                by_capability.entry(cap.clone()).or_default().push(Arc::clone(&tool));
            }
            by_name.insert(name, tool);
        }

        Self {
            by_name,
            by_category,
            by_capability,
        }
    }

    /// Look up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DispatchTool>> {
        self.by_name.get(name)
    }

    /// All tools in `category`.
    pub fn by_category(&self, category: &str) -> &[Arc<dyn DispatchTool>] {
        self.by_category.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All tools advertising `capability`.
    pub fn by_capability(&self, capability: &str) -> &[Arc<dyn DispatchTool>] {
        self.by_capability.get(capability).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All registered tools.
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn DispatchTool>> {
        self.by_name.values()
    }

    /// Aggregate counts.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            count: self.by_name.len(),
            categories: self.by_category.len(),
            capabilities: self.by_capability.len(),
        }
    }
}
