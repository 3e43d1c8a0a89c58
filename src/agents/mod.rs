//! Agent cards.
//!
//! Each agent publishes a card declaring its identity, skills, and the
//! command that starts its host process, so the orchestrator can discover
//! and route work without hardcoding tool lists.

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    pub name: String,
    pub description: String,
    pub tool_name: String,
    #[serde(default)]
    pub example_queries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Available,
    Busy,
    Offline,
}

/// Declares an agent's identity and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub status: AgentStatus,
    pub skills: Vec<AgentSkill>,
    /// Command to start the agent host process for subprocess pools.
    pub server_command: Vec<String>,
    /// Other agent ids this agent depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl AgentCard {
    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.tool_name.as_str()).collect()
    }
}

fn skill(name: &str, description: &str, tool_name: &str, example_queries: &[&str]) -> AgentSkill {
    AgentSkill {
        name: name.to_string(),
        description: description.to_string(),
        tool_name: tool_name.to_string(),
        example_queries: example_queries.iter().map(|q| q.to_string()).collect(),
    }
}

fn card(
    agent_id: &str,
    name: &str,
    description: &str,
    skills: Vec<AgentSkill>,
    dependencies: &[&str],
) -> AgentCard {
    AgentCard {
        agent_id: agent_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        version: "1.0.0".to_string(),
        status: AgentStatus::Available,
        skills,
        server_command: vec!["agent_host".to_string(), agent_id.to_string()],
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
    }
}

/// All registered agent cards, in routing order.
pub fn agent_registry() -> Vec<AgentCard> {
    vec![
        card(
            "client_research",
            "🔍 Client Research Agent",
            "Investigates client companies using web search and LinkedIn. \
             Can analyze RFP documents to extract requirements, technical specs, \
             budget indicators, and identify key decision makers.",
            vec![
                skill(
                    "company_research",
                    "Search and analyze company information from the web",
                    "search_company_info",
                    &[
                        "Research Acme Corp",
                        "What does this company do?",
                        "Find info about the client",
                    ],
                ),
                skill(
                    "rfp_analysis",
                    "Analyze an RFP document to extract structured requirements",
                    "analyze_rfp_document",
                    &[
                        "Analyze this RFP",
                        "Extract requirements from this document",
                        "What does the client need?",
                    ],
                ),
                skill(
                    "linkedin_research",
                    "Search LinkedIn for company profile and decision makers",
                    "search_linkedin_company",
                    &[
                        "Find them on LinkedIn",
                        "Who are the decision makers?",
                        "Search LinkedIn for the company",
                    ],
                ),
            ],
            &[],
        ),
        card(
            "knowledge_base",
            "📂 Knowledge Base Agent",
            "Searches internal projects, case studies, and documentation \
             to find relevant past work and reusable content for proposals.",
            vec![
                skill(
                    "project_search",
                    "Search past projects by keywords, sector, or requirements",
                    "search_past_projects",
                    &[
                        "Find similar projects",
                        "Do we have experience with mobile apps?",
                        "Projects in fintech",
                    ],
                ),
                skill(
                    "project_details",
                    "Get full details of a specific project by ID",
                    "get_project_details",
                    &["Show me project PRJ-001", "Details of the FoodRush project"],
                ),
                skill(
                    "tech_stack_search",
                    "Find projects by technologies used",
                    "search_tech_stack",
                    &[
                        "Projects using React and Python",
                        "Do we have experience with AWS?",
                    ],
                ),
                skill(
                    "case_studies",
                    "Retrieve case studies relevant to a client's sector",
                    "get_case_studies",
                    &[
                        "Case studies for a healthcare client",
                        "Show success stories in delivery apps",
                    ],
                ),
            ],
            &[],
        ),
        card(
            "pricing",
            "💰 Pricing Agent",
            "Estimates project costs based on scope analysis, team composition, \
             complexity multipliers, and configurable rate cards. Uses AI to \
             recommend team and hours, then calculates detailed cost breakdowns.",
            vec![
                skill(
                    "project_estimation",
                    "AI-powered full project cost estimation from a description",
                    "estimate_project",
                    &[
                        "How much will this project cost?",
                        "Estimate the budget",
                        "What's the pricing for this scope?",
                    ],
                ),
                skill(
                    "custom_estimation",
                    "Calculate cost from a manually defined team and hours",
                    "estimate_from_roles",
                    &[
                        "Price this with 2 backend devs for 300 hours",
                        "Custom team estimate",
                    ],
                ),
                skill(
                    "rate_card",
                    "View current hourly rates, multipliers, and discounts",
                    "get_rate_card",
                    &[
                        "What are our rates?",
                        "Show me the rate card",
                        "How much does a backend developer cost?",
                    ],
                ),
            ],
            &[],
        ),
        card(
            "proposal_writer",
            "📝 Proposal Writer Agent",
            "Generates professional technical and commercial proposals by combining \
             client research, internal knowledge, and pricing into a structured document. \
             Supports English and Spanish. Can also generate timelines and executive summaries.",
            vec![
                skill(
                    "full_proposal",
                    "Generate a complete technical/commercial proposal document",
                    "generate_proposal",
                    &[
                        "Write the proposal for Acme Corp",
                        "Generate a proposal in Spanish",
                        "Create the full proposal document",
                    ],
                ),
                skill(
                    "timeline",
                    "Generate a project timeline with phases and deliverables",
                    "generate_timeline",
                    &[
                        "Create a timeline for this project",
                        "How long will this take?",
                        "Break down the project into phases",
                    ],
                ),
                skill(
                    "executive_summary",
                    "Generate a concise executive summary from a full proposal",
                    "generate_executive_summary",
                    &[
                        "Summarize this proposal",
                        "Write an executive summary",
                        "Give me the TL;DR of the proposal",
                    ],
                ),
                skill(
                    "export_docx",
                    "Export a markdown proposal to a professional Word document (.docx)",
                    "export_proposal_docx",
                    &[
                        "Export the proposal to Word",
                        "Generate the DOCX file",
                        "Save the proposal as a Word document",
                    ],
                ),
            ],
            &["client_research", "knowledge_base"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::{tools_for_agent, BUILTIN_AGENT_IDS};

    #[test]
    fn test_registry_covers_all_builtin_agents() {
        let cards = agent_registry();
        let mut ids: Vec<&str> = cards.iter().map(|c| c.agent_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, BUILTIN_AGENT_IDS);
    }

    #[test]
    fn test_card_skills_match_registered_tools() {
        for agent_card in agent_registry() {
            let mut declared = agent_card.tool_names();
            declared.sort();
            let mut registered: Vec<String> = tools_for_agent(&agent_card.agent_id)
                .iter()
                .map(|t| t.definition().name)
                .collect();
            registered.sort();
            assert_eq!(declared, registered, "{}", agent_card.agent_id);
        }
    }

    #[test]
    fn test_proposal_writer_declares_dependencies() {
        let cards = agent_registry();
        let writer = cards
            .iter()
            .find(|c| c.agent_id == "proposal_writer")
            .unwrap();
        assert_eq!(writer.dependencies, vec!["client_research", "knowledge_base"]);
        assert_eq!(writer.server_command, vec!["agent_host", "proposal_writer"]);
        assert_eq!(writer.status, AgentStatus::Available);
    }
}
