//! Pool variant that dispatches tool calls straight into the registry.
//! No processes are spawned; agents are just marked connected.

use crate::agents::{AgentCard, AgentStatus};
use crate::pool::{PoolToolOutput, ToolDescriptor, ToolPool};
use crate::tools::{ToolContext, ToolRegistry};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

pub struct InProcessPool {
    registry: ToolRegistry,
    context: ToolContext,
    connected: RwLock<Vec<String>>,
}

impl InProcessPool {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        InProcessPool {
            registry,
            context,
            connected: RwLock::new(Vec::new()),
        }
    }

    fn is_connected(&self, agent_id: &str) -> bool {
        self.connected.read().iter().any(|id| id == agent_id)
    }
}

#[async_trait]
impl ToolPool for InProcessPool {
    async fn connect(&self, card: &AgentCard) -> Result<(), String> {
        if card.status == AgentStatus::Offline {
            log::warn!(
                "[pool] Agent '{}' is offline, skipping connection",
                card.agent_id
            );
            return Ok(());
        }
        let mut connected = self.connected.write();
        if !connected.contains(&card.agent_id) {
            connected.push(card.agent_id.clone());
        }
        log::info!("[pool] Agent registered (in-process): {}", card.name);
        Ok(())
    }

    async fn disconnect_all(&self) {
        self.connected.write().clear();
    }

    fn connected_agents(&self) -> Vec<String> {
        self.connected.read().clone()
    }

    async fn list_tools(&self) -> HashMap<String, Vec<ToolDescriptor>> {
        let mut all_tools = HashMap::new();
        for agent_id in self.connected.read().iter() {
            let descriptors: Vec<ToolDescriptor> = self
                .registry
                .tools_for_agent(agent_id)
                .into_iter()
                .map(|definition| ToolDescriptor {
                    name: definition.name,
                    description: definition.description,
                    input_schema: serde_json::to_value(definition.input_schema)
                        .unwrap_or(Value::Null),
                })
                .collect();
            all_tools.insert(agent_id.clone(), descriptors);
        }
        all_tools
    }

    async fn call(&self, agent_id: &str, tool_name: &str, arguments: Value) -> PoolToolOutput {
        if !self.is_connected(agent_id) {
            return PoolToolOutput::agent_not_found(agent_id);
        }
        let Some(tool) = self.registry.get(agent_id, tool_name) else {
            return PoolToolOutput::tool_not_found(agent_id, tool_name);
        };

        let result = tool.execute(arguments, &self.context).await;
        if result.success {
            PoolToolOutput::text(result.content, result.kind)
        } else {
            let description = result.error.unwrap_or_else(|| "unknown error".to_string());
            log::error!("[pool] Error calling {}/{}: {}", agent_id, tool_name, description);
            PoolToolOutput::call_failed(&description)
        }
    }
}
