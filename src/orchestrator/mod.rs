//! Orchestrator: the reasoning loop that routes user requests to agents.
//!
//! Tools are advertised to the model under composite names
//! `{agent_id}__{tool_name}` so one flat tool list can route back to the
//! owning agent. The loop runs until the model stops requesting tools or
//! the iteration cap is reached.

pub mod schema;

use crate::agents::{AgentCard, AgentStatus};
use crate::ai::{AiError, ClaudeContentBlock, ClaudeMessage, ClaudeTool, ReasoningBackend};
use crate::pool::{PoolToolOutput, ToolDescriptor, ToolPool};
use crate::tools::types::ToolResultKind;
use schema::resolve_schema_refs;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_TOKENS: u32 = 4096;

const AUTO_EXPORT_KEYWORDS: [&str; 4] = ["docx", "word", "exporta", "documento"];

const MAX_ITERATIONS_MESSAGE: &str =
    "⚠️ Maximum orchestration iterations reached. Partial results may be available.";

const ORCHESTRATOR_SYSTEM_PROMPT: &str = r#"You are the orchestrator of a Smart RFP/Proposal Agent system.
Your job is to coordinate specialized agents to help users create commercial proposals.

## Available Agents and Tools
{agent_context}

## Your Workflow
1. Analyze the user's request
2. Decide which tool(s) to call and in what order
3. Use tool calls to delegate work to specialized agents
4. After receiving tool results, synthesize a final response for the user

## Full Proposal Workflow (when user asks for a complete proposal)
1. **Research**: Use client_research tools to investigate the company
2. **Knowledge Base**: Search for similar past projects and case studies
3. **Pricing**: Estimate project costs based on scope
4. **Generate Proposal**: Use proposal_writer__generate_proposal with all gathered data
5. **Export to DOCX**: If user requests DOCX/Word export, use proposal_writer__export_proposal_docx passing the full markdown proposal

## Rules
- Always start by researching the client company if a company name is mentioned
- If an RFP document text is provided, analyze it with the RFP tool
- Search LinkedIn for decision makers when preparing a proposal
- Combine results from multiple tools into a coherent summary
- If a required agent is offline, inform the user what's missing
- Respond in the same language the user uses
- IMPORTANT: You CAN export proposals to DOCX using the export_proposal_docx tool. Always use it when the user asks for Word/DOCX export.
- When exporting to DOCX, pass the FULL markdown content of the proposal as proposal_markdown parameter
"#;

struct PendingProposal {
    markdown: String,
    client_name: String,
}

pub struct Orchestrator {
    backend: Arc<dyn ReasoningBackend>,
    pool: Arc<dyn ToolPool>,
    cards: Vec<AgentCard>,
    model: String,
    max_iterations: usize,
    history: Vec<ClaudeMessage>,
    pending: Option<PendingProposal>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn ReasoningBackend>,
        pool: Arc<dyn ToolPool>,
        cards: Vec<AgentCard>,
        model: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Orchestrator {
            backend,
            pool,
            cards,
            model: model.into(),
            max_iterations,
            history: Vec::new(),
            pending: None,
        }
    }

    /// Connect every available agent, logging failures instead of aborting
    /// so one broken agent does not take the whole system down.
    pub async fn start(&self) {
        for card in &self.cards {
            if card.status != AgentStatus::Available {
                continue;
            }
            match self.pool.connect(card).await {
                Ok(()) => log::info!("[orchestrator] Agent connected: {}", card.name),
                Err(e) => log::error!("[orchestrator] Failed to connect {}: {}", card.name, e),
            }
        }
        log::info!(
            "[orchestrator] Ready. Agents online: {:?}",
            self.pool.connected_agents()
        );
    }

    pub async fn stop(&self) {
        self.pool.disconnect_all().await;
        log::info!("[orchestrator] Stopped.");
    }

    pub fn reset_conversation(&mut self) {
        self.history.clear();
        self.pending = None;
    }

    /// Process one user message through the orchestration loop.
    pub async fn chat(&mut self, user_message: &str) -> Result<String, AiError> {
        let tools_by_agent = self.pool.list_tools().await;
        let agent_context = build_agent_context(&self.cards, &tools_by_agent);
        let claude_tools = build_claude_tools(&self.cards, &tools_by_agent);
        let system_prompt = ORCHESTRATOR_SYSTEM_PROMPT.replace("{agent_context}", &agent_context);

        self.history.push(ClaudeMessage::user(user_message));

        log::info!("[orchestrator] Sending {} tools to the model", claude_tools.len());
        for iteration in 0..self.max_iterations {
            log::info!("[orchestrator] Iteration {}", iteration + 1);

            let response = self
                .backend
                .reason(&self.model, &system_prompt, &self.history, &claude_tools, MAX_TOKENS)
                .await?;

            let mut blocks = Vec::new();
            if !response.content.is_empty() {
                blocks.push(ClaudeContentBlock::Text {
                    text: response.content.clone(),
                });
            }
            for call in &response.tool_calls {
                blocks.push(ClaudeContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });
            }
            self.history.push(ClaudeMessage::assistant_with_blocks(blocks));

            if !response.is_tool_use() {
                let mut final_text = response.content;
                self.maybe_auto_export(user_message, &mut final_text).await;
                return Ok(final_text);
            }

            let mut tool_results = Vec::new();
            for call in &response.tool_calls {
                log::info!("[orchestrator] Tool call: {}", call.name);
                let output = self
                    .execute_tool_call(&call.name, call.arguments.clone())
                    .await;

                if let ToolResultKind::Proposal { client_name } = &output.kind {
                    self.pending = Some(PendingProposal {
                        markdown: output.content.clone(),
                        client_name: client_name.clone(),
                    });
                }

                tool_results.push(ClaudeContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: output.content,
                });
            }
            self.history
                .push(ClaudeMessage::user_with_tool_results(tool_results));
        }

        Ok(MAX_ITERATIONS_MESSAGE.to_string())
    }

    /// Route a composite `agent__tool` call through the pool.
    async fn execute_tool_call(&self, tool_name: &str, arguments: Value) -> PoolToolOutput {
        let Some((agent_id, agent_tool)) = tool_name.split_once("__") else {
            return PoolToolOutput {
                content: json!({"error": format!("Invalid tool name format: {}", tool_name)})
                    .to_string(),
                kind: ToolResultKind::Generic,
            };
        };
        log::info!("[orchestrator] Calling tool '{}' on agent '{}'", agent_tool, agent_id);
        self.pool.call(agent_id, agent_tool, arguments).await
    }

    /// Export a generated proposal to DOCX when the user asked for one.
    /// The pending proposal is cleared only after a successful export so a
    /// failed attempt can be retried on the next turn.
    async fn maybe_auto_export(&mut self, user_message: &str, final_text: &mut String) {
        let message = user_message.to_lowercase();
        let wants_docx = AUTO_EXPORT_KEYWORDS.iter().any(|kw| message.contains(kw));
        let Some(pending) = &self.pending else {
            return;
        };
        if !wants_docx {
            return;
        }

        log::info!(
            "[orchestrator] Auto-exporting proposal to DOCX for {}",
            pending.client_name
        );
        let output = self
            .execute_tool_call(
                "proposal_writer__export_proposal_docx",
                json!({
                    "proposal_markdown": pending.markdown,
                    "client_name": pending.client_name,
                    "project_title": format!("Technical Proposal — {}", pending.client_name),
                }),
            )
            .await;

        let failed = serde_json::from_str::<Value>(&output.content)
            .map(|v| v.get("error").is_some())
            .unwrap_or(true);
        if failed {
            log::error!("[orchestrator] Auto-export failed: {}", output.content);
            final_text.push_str(&format!(
                "\n\n⚠️ No se pudo exportar a DOCX automáticamente: {}",
                output.content
            ));
        } else {
            final_text.push_str(&format!(
                "\n\n---\n📄 **Documento DOCX generado automáticamente.**\n{}",
                output.content
            ));
            self.pending = None;
        }
    }
}

/// Markdown description of every registered agent, its status, and its
/// advertised tools, for the system prompt.
fn build_agent_context(
    cards: &[AgentCard],
    tools_by_agent: &HashMap<String, Vec<ToolDescriptor>>,
) -> String {
    let mut lines = Vec::new();
    for card in cards {
        let status_icon = if card.status == AgentStatus::Available {
            "🟢"
        } else {
            "🔴"
        };
        lines.push(format!(
            "\n### {} {} (id: {})",
            status_icon, card.name, card.agent_id
        ));
        lines.push(format!("Description: {}", card.description));

        if let Some(tools) = tools_by_agent.get(&card.agent_id) {
            lines.push("Tools:".to_string());
            for tool in tools {
                lines.push(format!("  - **{}**: {}", tool.name, tool.description));
            }
        } else if card.status == AgentStatus::Offline {
            lines.push("Status: OFFLINE — not available yet".to_string());
        }
    }
    lines.join("\n")
}

/// Flatten pool tools into Messages API tool definitions under composite
/// names, with simplified schemas.
fn build_claude_tools(
    cards: &[AgentCard],
    tools_by_agent: &HashMap<String, Vec<ToolDescriptor>>,
) -> Vec<ClaudeTool> {
    let mut claude_tools = Vec::new();
    for card in cards {
        let Some(tools) = tools_by_agent.get(&card.agent_id) else {
            continue;
        };
        for tool in tools {
            claude_tools.push(ClaudeTool {
                name: format!("{}__{}", card.agent_id, tool.name),
                description: format!("[Agent: {}] {}", card.agent_id, tool.description),
                input_schema: resolve_schema_refs(tool.input_schema.clone()),
            });
        }
    }
    claude_tools
}
