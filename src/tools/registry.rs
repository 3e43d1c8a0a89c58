//! Tool trait and the registry that maps (agent id, tool name) to
//! implementations.

use crate::tools::types::{ToolContext, ToolDefinition, ToolResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One callable operation with a declared input schema and textual output.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult;
}

/// Registry of tools grouped by owning agent.
pub struct ToolRegistry {
    tools: RwLock<HashMap<(String, String), Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, agent_id: &str, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        log::debug!("[registry] Registering tool '{}' for agent '{}'", name, agent_id);
        self.tools
            .write()
            .insert((agent_id.to_string(), name), tool);
    }

    pub fn get(&self, agent_id: &str, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .get(&(agent_id.to_string(), name.to_string()))
            .cloned()
    }

    /// Definitions of all tools owned by an agent, sorted by name.
    pub fn tools_for_agent(&self, agent_id: &str) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .read()
            .iter()
            .filter(|((agent, _), _)| agent == agent_id)
            .map(|(_, tool)| tool.definition())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Agent ids that have at least one registered tool, sorted.
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tools
            .read()
            .keys()
            .map(|(agent, _)| agent.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    pub async fn execute(
        &self,
        agent_id: &str,
        name: &str,
        params: Value,
        context: &ToolContext,
    ) -> ToolResult {
        match self.get(agent_id, name) {
            Some(tool) => tool.execute(params, context).await,
            None => ToolResult::error(format!("Tool '{}' not found", name)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> ToolContext {
        test_support::test_context(
            Arc::new(StubGenerator::new("")),
            Arc::new(StubSearch::empty()),
            std::path::Path::new("."),
        )
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let registry = ToolRegistry::new();
        registry.register(
            "pricing",
            Arc::new(MockTool {
                name: "get_rate_card".to_string(),
            }),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.agent_ids(), vec!["pricing".to_string()]);

        let result = registry
            .execute("pricing", "get_rate_card", json!({"message": "hi"}), &context())
            .await;
        assert!(result.success);
        assert!(result.content.contains("hi"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_not_a_panic() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute("pricing", "nonexistent", json!({}), &context())
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Tool 'nonexistent' not found"));
    }

    #[test]
    fn test_tools_are_scoped_per_agent() {
        let registry = ToolRegistry::new();
        registry.register(
            "pricing",
            Arc::new(MockTool {
                name: "estimate".to_string(),
            }),
        );
        registry.register(
            "knowledge_base",
            Arc::new(MockTool {
                name: "estimate".to_string(),
            }),
        );

        assert_eq!(registry.len(), 2);
        assert!(registry.get("pricing", "estimate").is_some());
        assert!(registry.get("client_research", "estimate").is_none());
        assert_eq!(registry.tools_for_agent("pricing").len(), 1);
    }
}
