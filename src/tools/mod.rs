pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult, ToolResultKind,
};

/// Build a registry with every built-in agent tool registered.
pub fn create_default_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    for agent_id in builtin::BUILTIN_AGENT_IDS {
        for tool in builtin::tools_for_agent(agent_id) {
            registry.register(agent_id, tool);
        }
    }
    registry
}

/// Build a registry holding only one agent's tools (for agent host processes).
pub fn create_agent_registry(agent_id: &str) -> Option<ToolRegistry> {
    let tools = builtin::tools_for_agent(agent_id);
    if tools.is_empty() {
        return None;
    }
    let registry = ToolRegistry::new();
    for tool in tools {
        registry.register(agent_id, tool);
    }
    Some(registry)
}
