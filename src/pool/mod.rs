//! Agent tool pools.
//!
//! A pool owns the connections to agents and exposes a uniform surface to
//! the orchestrator: connect, enumerate tools, call. Two variants exist
//! with the same contract: [`InProcessPool`] dispatches straight into the
//! tool registry, [`SubprocessPool`] talks JSON-RPC over stdio to agent
//! host processes.

pub mod host;
pub mod in_process;
pub mod protocol;
pub mod subprocess;

pub use in_process::InProcessPool;
pub use subprocess::SubprocessPool;

use crate::agents::AgentCard;
use crate::tools::types::ToolResultKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// One tool as advertised by a pool, schema included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Outcome of a pool tool call. Failures are folded into `content` as a
/// JSON error object so the orchestrator can always hand the model a
/// string result.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolToolOutput {
    pub content: String,
    pub kind: ToolResultKind,
}

impl PoolToolOutput {
    pub fn text(content: String, kind: ToolResultKind) -> Self {
        PoolToolOutput { content, kind }
    }

    pub fn agent_not_found(agent_id: &str) -> Self {
        Self::error_json(format!("Agent '{}' not found or not connected", agent_id))
    }

    pub fn tool_not_found(agent_id: &str, tool_name: &str) -> Self {
        Self::error_json(format!(
            "Tool '{}' not found on agent '{}'",
            tool_name, agent_id
        ))
    }

    pub fn call_failed(description: &str) -> Self {
        Self::error_json(format!("Tool call failed: {}", description))
    }

    fn error_json(message: String) -> Self {
        PoolToolOutput {
            content: json!({ "error": message }).to_string(),
            kind: ToolResultKind::Generic,
        }
    }
}

#[async_trait]
pub trait ToolPool: Send + Sync {
    /// Register or connect an agent. Offline agents are skipped.
    async fn connect(&self, card: &AgentCard) -> Result<(), String>;

    async fn disconnect_all(&self);

    /// Ids of agents currently connected.
    fn connected_agents(&self) -> Vec<String>;

    /// All tools of all connected agents, grouped by agent id.
    async fn list_tools(&self) -> HashMap<String, Vec<ToolDescriptor>>;

    async fn call(&self, agent_id: &str, tool_name: &str, arguments: Value) -> PoolToolOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shapes() {
        let out = PoolToolOutput::agent_not_found("pricing");
        assert_eq!(
            out.content,
            r#"{"error":"Agent 'pricing' not found or not connected"}"#
        );
        assert_eq!(out.kind, ToolResultKind::Generic);

        let out = PoolToolOutput::tool_not_found("pricing", "estimate");
        assert_eq!(
            out.content,
            r#"{"error":"Tool 'estimate' not found on agent 'pricing'"}"#
        );

        let out = PoolToolOutput::call_failed("boom");
        assert_eq!(out.content, r#"{"error":"Tool call failed: boom"}"#);
    }
}
