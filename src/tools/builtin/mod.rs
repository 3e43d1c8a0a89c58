//! Built-in agent tools.
//!
//! One module per agent; each tool follows the same contract: deserialize
//! and validate input before any network call, execute, then render the
//! result as Markdown (default) or JSON.

pub mod client_research;
pub mod knowledge_base;
pub mod pricing;
pub mod proposal_writer;

use crate::tools::registry::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const BUILTIN_AGENT_IDS: [&str; 4] = [
    "client_research",
    "knowledge_base",
    "pricing",
    "proposal_writer",
];

/// All tools owned by the given agent. Unknown agents get an empty list.
pub fn tools_for_agent(agent_id: &str) -> Vec<Arc<dyn Tool>> {
    match agent_id {
        "client_research" => vec![
            Arc::new(client_research::SearchCompanyInfoTool) as Arc<dyn Tool>,
            Arc::new(client_research::AnalyzeRfpDocumentTool),
            Arc::new(client_research::SearchLinkedInCompanyTool),
        ],
        "knowledge_base" => vec![
            Arc::new(knowledge_base::SearchPastProjectsTool) as Arc<dyn Tool>,
            Arc::new(knowledge_base::GetProjectDetailsTool),
            Arc::new(knowledge_base::SearchTechStackTool),
            Arc::new(knowledge_base::GetCaseStudiesTool),
        ],
        "pricing" => vec![
            Arc::new(pricing::EstimateProjectTool) as Arc<dyn Tool>,
            Arc::new(pricing::EstimateFromRolesTool),
            Arc::new(pricing::GetRateCardTool),
        ],
        "proposal_writer" => vec![
            Arc::new(proposal_writer::GenerateProposalTool) as Arc<dyn Tool>,
            Arc::new(proposal_writer::GenerateTimelineTool),
            Arc::new(proposal_writer::GenerateExecutiveSummaryTool),
            Arc::new(proposal_writer::ExportProposalDocxTool),
        ],
        _ => Vec::new(),
    }
}

/// Output format selector shared by most tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

/// Pretty-printed JSON string for tool output.
pub(crate) fn format_json_response(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Structured error for model output that did not parse as the requested
/// JSON shape. Carries a bounded excerpt of the raw text, never the full
/// payload.
pub(crate) fn parse_failure(label: &str, raw: &str) -> String {
    let excerpt: String = raw.chars().take(500).collect();
    format_json_response(&json!({
        "error": label,
        "raw_response": excerpt,
    }))
}

/// Thousands separator formatting for hour and cost figures.
pub(crate) fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Title-case a snake_case identifier ("backend_dev" -> "Backend Dev").
pub(crate) fn titleize(id: &str) -> String {
    id.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
