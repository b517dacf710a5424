use crate::tools::types::{ToolDefinition, ToolKind, ToolResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition sent to the reasoning oracle.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the given parameters.
    async fn execute(&self, params: Value) -> ToolResult;

    /// Returns the tool's name.
    fn name(&self) -> String {
        self.definition().name.clone()
    }

    /// Returns the tool's output identity class.
    fn kind(&self) -> ToolKind {
        self.definition().kind
    }
}

/// Registry that holds all available tools.
/// Uses interior mutability (RwLock) so tools can be registered at runtime
/// without requiring &mut self.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool (thread-safe, takes &self via interior mutability).
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        self.tools.write().insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// List all registered tools.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.read().values().cloned().collect()
    }

    /// Get tool definitions for sending to the oracle.
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.list().iter().map(|tool| tool.definition()).collect()
    }

    /// Look up the output identity class for a tool name.
    pub fn kind_of(&self, name: &str) -> Option<ToolKind> {
        self.get(name).map(|tool| tool.kind())
    }

    /// Execute a tool by name. An unknown tool yields a failure result
    /// rather than an error, so the run can continue.
    pub async fn execute(&self, name: &str, params: Value) -> ToolResult {
        let tool = match self.get(name) {
            Some(t) => t,
            None => return ToolResult::error(format!("Tool '{}' not found", name)),
        };

        tool.execute(params).await
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Get count of registered tools.
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::ToolInputSchema;

    struct MockTool {
        definition: ToolDefinition,
    }

    impl MockTool {
        fn new(name: &str, kind: ToolKind) -> Self {
            MockTool {
                definition: ToolDefinition {
                    name: name.to_string(),
                    description: format!("Mock {} tool", name),
                    input_schema: ToolInputSchema::default(),
                    kind,
                },
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn definition(&self) -> ToolDefinition {
            self.definition.clone()
        }

        async fn execute(&self, _params: Value) -> ToolResult {
            ToolResult::success("mock result")
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("sql_database_query", ToolKind::Query)));

        assert!(registry.has_tool("sql_database_query"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.kind_of("sql_database_query"), Some(ToolKind::Query));
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("document_search", ToolKind::DocumentSearch)));
        registry.register(Arc::new(MockTool::new(
            "query_and_visualize",
            ToolKind::Visualization,
        )));

        let mut names: Vec<String> = registry
            .get_tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["document_search", "query_and_visualize"]);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_is_failure_not_panic() {
        let registry = ToolRegistry::new();
        let result = registry.execute("missing", serde_json::json!({})).await;
        assert!(!result.success);
        assert!(result.content.contains("not found"));
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("document_search", ToolKind::DocumentSearch)));
        let result = registry.execute("document_search", serde_json::json!({})).await;
        assert!(result.success);
        assert_eq!(result.content, "mock result");
    }
}
