//! Client research tools: web research, RFP analysis, LinkedIn lookup.

use crate::ai::search::SearchResult;
use crate::tools::builtin::{format_json_response, parse_failure, ResponseFormat};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

const ANALYSIS_MODEL: &str = "claude-haiku-4-5-20251001";
const ANALYSIS_MAX_TOKENS: u32 = 2000;

/// Structured company information extracted from search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub key_people: Vec<String>,
    #[serde(default)]
    pub recent_news: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfpAnalysis {
    pub project_summary: String,
    #[serde(default)]
    pub key_requirements: Vec<String>,
    #[serde(default)]
    pub technical_requirements: Vec<String>,
    #[serde(default)]
    pub budget_indicators: Option<String>,
    #[serde(default)]
    pub timeline_indicators: Option<String>,
    #[serde(default)]
    pub evaluation_criteria: Vec<String>,
    #[serde(default)]
    pub risks_and_concerns: Vec<String>,
}

fn search_context(results: &[SearchResult], label: &str) -> String {
    let mut context = String::new();
    for (i, r) in results.iter().enumerate() {
        context.push_str(&format!("{} {}: {}\n", label, i + 1, r.title));
        context.push_str(&format!("URL: {}\n", r.url));
        context.push_str(&format!("Content: {}\n\n", r.content));
    }
    context
}

fn response_format_property() -> PropertySchema {
    PropertySchema::string("Output format: 'markdown' for readable or 'json' for structured")
        .with_default(json!("markdown"))
        .with_enum(&["markdown", "json"])
}

// ── search_company_info ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchCompanyParams {
    company_name: String,
    #[serde(default)]
    additional_context: Option<String>,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl SearchCompanyParams {
    fn validate(&mut self) -> Result<(), String> {
        self.company_name = self.company_name.trim().to_string();
        if self.company_name.is_empty() || self.company_name.chars().count() > 200 {
            return Err("company_name must be between 1 and 200 characters".to_string());
        }
        if let Some(context) = &self.additional_context {
            if context.chars().count() > 500 {
                return Err("additional_context must be at most 500 characters".to_string());
            }
        }
        Ok(())
    }
}

pub struct SearchCompanyInfoTool;

#[async_trait]
impl Tool for SearchCompanyInfoTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "company_name".to_string(),
            PropertySchema::string("Name of the company to research (e.g., 'Acme Corp', 'Stripe')"),
        );
        properties.insert(
            "additional_context".to_string(),
            PropertySchema::string(
                "Extra context to refine the search (e.g., 'fintech startup in Madrid')",
            ),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "search_company_info".to_string(),
            description: "Research a company using web search plus AI analysis. Returns a \
                          structured profile with sector, size, technologies, key people, and \
                          recent news."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["company_name"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: SearchCompanyParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let mut query = format!("{} company info sector size funding", params.company_name);
        if let Some(extra) = &params.additional_context {
            query.push(' ');
            query.push_str(extra);
        }

        let outcome = match context.search.search(&query, 5).await {
            Ok(o) => o,
            Err(e) => return ToolResult::success(e.message),
        };

        if outcome.is_empty() {
            return ToolResult::success(format_json_response(&json!({
                "error": format!("No results found for '{}'", params.company_name),
                "suggestion": "Try adding more context about the company",
            })));
        }

        let mut search_block = format!(
            "Tavily summary: {}\n\n",
            outcome.answer.as_deref().unwrap_or("")
        );
        search_block.push_str(&search_context(&outcome.results, "Source"));

        let system_prompt = r#"You are a business research analyst. Extract structured company
information from search results. Respond ONLY with a valid JSON object matching this schema:
{
    "name": "string",
    "sector": "string or null",
    "description": "brief company description",
    "size": "estimated employee count/range or null",
    "location": "headquarters location or null",
    "website": "main website URL or null",
    "funding": "funding info or null",
    "technologies": ["list of technologies they use or offer"],
    "key_people": ["CEO: Name", "CTO: Name"],
    "recent_news": ["brief news items"]
}
Do NOT include markdown backticks. Return ONLY the JSON object."#;

        let prompt = format!(
            "Research this company: {}\n\nSearch results:\n{}",
            params.company_name, search_block
        );
        let raw = match context
            .generator
            .generate_text(ANALYSIS_MODEL, system_prompt, &prompt, ANALYSIS_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        let profile: CompanyProfile = match serde_json::from_str(raw.trim()) {
            Ok(p) => p,
            Err(_) => {
                return ToolResult::success(parse_failure("Failed to parse company analysis", &raw))
            }
        };

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(
                &serde_json::to_value(&profile).unwrap_or(Value::Null),
            ));
        }

        let mut md = format!("# 🏢 {}\n\n", profile.name);
        if let Some(description) = &profile.description {
            md.push_str(&format!("{}\n\n", description));
        }
        if let Some(sector) = &profile.sector {
            md.push_str(&format!("**Sector:** {}\n", sector));
        }
        if let Some(size) = &profile.size {
            md.push_str(&format!("**Size:** {}\n", size));
        }
        if let Some(location) = &profile.location {
            md.push_str(&format!("**Location:** {}\n", location));
        }
        if let Some(website) = &profile.website {
            md.push_str(&format!("**Website:** {}\n", website));
        }
        if let Some(funding) = &profile.funding {
            md.push_str(&format!("**Funding:** {}\n", funding));
        }
        if !profile.technologies.is_empty() {
            md.push_str(&format!(
                "\n**Technologies:** {}\n",
                profile.technologies.join(", ")
            ));
        }
        if !profile.key_people.is_empty() {
            md.push_str("\n**Key People:**\n");
            for person in &profile.key_people {
                md.push_str(&format!("- {}\n", person));
            }
        }
        if !profile.recent_news.is_empty() {
            md.push_str("\n**Recent News:**\n");
            for news in &profile.recent_news {
                md.push_str(&format!("- {}\n", news));
            }
        }

        ToolResult::success(md)
    }
}

// ── analyze_rfp_document ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnalyzeRfpParams {
    rfp_text: String,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl AnalyzeRfpParams {
    fn validate(&mut self) -> Result<(), String> {
        self.rfp_text = self.rfp_text.trim().to_string();
        if self.rfp_text.chars().count() < 10 {
            return Err("rfp_text must be at least 10 characters".to_string());
        }
        Ok(())
    }
}

pub struct AnalyzeRfpDocumentTool;

#[async_trait]
impl Tool for AnalyzeRfpDocumentTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "rfp_text".to_string(),
            PropertySchema::string("Full text content of the RFP document to analyze"),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "analyze_rfp_document".to_string(),
            description: "Analyze an RFP document to extract requirements, technical specs, \
                          budget indicators, timeline, evaluation criteria, and risks."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["rfp_text"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: AnalyzeRfpParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let system_prompt = r#"You are an expert proposal analyst. Analyze the RFP document and
extract structured information. Respond ONLY with a valid JSON object matching this schema:
{
    "project_summary": "2-3 sentence summary of what the client needs",
    "key_requirements": ["list of main business requirements"],
    "technical_requirements": ["list of technical requirements"],
    "budget_indicators": "any budget mentions or constraints, or null",
    "timeline_indicators": "any timeline/deadline info, or null",
    "evaluation_criteria": ["how proposals will be evaluated"],
    "risks_and_concerns": ["potential risks or red flags"]
}
Do NOT include markdown backticks. Return ONLY the JSON object."#;

        let prompt = format!("Analyze this RFP document:\n\n{}", params.rfp_text);
        let raw = match context
            .generator
            .generate_text(ANALYSIS_MODEL, system_prompt, &prompt, ANALYSIS_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        let analysis: RfpAnalysis = match serde_json::from_str(raw.trim()) {
            Ok(a) => a,
            Err(_) => return ToolResult::success(parse_failure("Failed to parse RFP analysis", &raw)),
        };

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(
                &serde_json::to_value(&analysis).unwrap_or(Value::Null),
            ));
        }

        let mut md = String::from("# 📋 RFP Analysis\n\n");
        md.push_str(&format!("## Summary\n{}\n\n", analysis.project_summary));

        if !analysis.key_requirements.is_empty() {
            md.push_str("## Key Requirements\n");
            for req in &analysis.key_requirements {
                md.push_str(&format!("- {}\n", req));
            }
            md.push('\n');
        }
        if !analysis.technical_requirements.is_empty() {
            md.push_str("## Technical Requirements\n");
            for req in &analysis.technical_requirements {
                md.push_str(&format!("- {}\n", req));
            }
            md.push('\n');
        }
        if let Some(budget) = &analysis.budget_indicators {
            md.push_str(&format!("## Budget\n{}\n\n", budget));
        }
        if let Some(timeline) = &analysis.timeline_indicators {
            md.push_str(&format!("## Timeline\n{}\n\n", timeline));
        }
        if !analysis.evaluation_criteria.is_empty() {
            md.push_str("## Evaluation Criteria\n");
            for criteria in &analysis.evaluation_criteria {
                md.push_str(&format!("- {}\n", criteria));
            }
            md.push('\n');
        }
        if !analysis.risks_and_concerns.is_empty() {
            md.push_str("## ⚠️ Risks & Concerns\n");
            for risk in &analysis.risks_and_concerns {
                md.push_str(&format!("- {}\n", risk));
            }
        }

        ToolResult::success(md)
    }
}

// ── search_linkedin_company ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchLinkedInParams {
    company_name: String,
    #[serde(default = "default_true")]
    find_decision_makers: bool,
    #[serde(default)]
    response_format: ResponseFormat,
}

fn default_true() -> bool {
    true
}

impl SearchLinkedInParams {
    fn validate(&mut self) -> Result<(), String> {
        self.company_name = self.company_name.trim().to_string();
        if self.company_name.is_empty() || self.company_name.chars().count() > 200 {
            return Err("company_name must be between 1 and 200 characters".to_string());
        }
        Ok(())
    }
}

/// LinkedIn research via site-restricted web search. Direct LinkedIn API
/// access needs OAuth plus page admin rights, so this reads only public
/// pages surfaced by the search backend.
pub struct SearchLinkedInCompanyTool;

#[async_trait]
impl Tool for SearchLinkedInCompanyTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "company_name".to_string(),
            PropertySchema::string("Company name to search on LinkedIn"),
        );
        properties.insert(
            "find_decision_makers".to_string(),
            PropertySchema::boolean(
                "Whether to search for key decision makers (CTO, CEO, VP Engineering)",
            )
            .with_default(json!(true)),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "search_linkedin_company".to_string(),
            description: "Search LinkedIn for a company's public profile and key decision \
                          makers, summarized into a structured report."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["company_name"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: SearchLinkedInParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let mut queries = vec![format!("site:linkedin.com/company {}", params.company_name)];
        if params.find_decision_makers {
            queries.push(format!(
                "site:linkedin.com/in {} CTO OR CEO OR 'VP Engineering' OR Director",
                params.company_name
            ));
        }

        let mut all_results = Vec::new();
        for query in &queries {
            match context.search.search(query, 5).await {
                Ok(outcome) => all_results.extend(outcome.results),
                Err(e) => return ToolResult::success(e.message),
            }
        }

        if all_results.is_empty() {
            return ToolResult::success(format_json_response(&json!({
                "error": format!("No LinkedIn results found for '{}'", params.company_name),
                "suggestion": "Try the search_company_info tool for general web results",
            })));
        }

        let system_prompt = r#"You are a business intelligence analyst. From LinkedIn search results,
extract company and people information. Respond ONLY with a valid JSON object:
{
    "company_linkedin_url": "LinkedIn company page URL or null",
    "company_summary": "brief description from LinkedIn or null",
    "employee_count": "estimated from LinkedIn or null",
    "industry": "industry from LinkedIn or null",
    "decision_makers": [
        {"name": "Full Name", "role": "Title", "linkedin_url": "URL or null"}
    ],
    "insights": ["any useful insights from LinkedIn presence"]
}
Do NOT include markdown backticks. Return ONLY the JSON object."#;

        let prompt = format!(
            "Extract LinkedIn info for: {}\n\nSearch results:\n{}",
            params.company_name,
            search_context(&all_results, "Result")
        );
        let raw = match context
            .generator
            .generate_text(ANALYSIS_MODEL, system_prompt, &prompt, ANALYSIS_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        let data: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(_) => {
                return ToolResult::success(parse_failure("Failed to parse LinkedIn analysis", &raw))
            }
        };

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(&data));
        }

        let mut md = format!("# 🔗 LinkedIn Research: {}\n\n", params.company_name);
        if let Some(url) = data.get("company_linkedin_url").and_then(Value::as_str) {
            md.push_str(&format!("**Profile:** {}\n", url));
        }
        if let Some(summary) = data.get("company_summary").and_then(Value::as_str) {
            md.push_str(&format!("**About:** {}\n", summary));
        }
        if let Some(count) = data.get("employee_count").and_then(Value::as_str) {
            md.push_str(&format!("**Employees:** {}\n", count));
        }
        if let Some(industry) = data.get("industry").and_then(Value::as_str) {
            md.push_str(&format!("**Industry:** {}\n", industry));
        }

        if let Some(people) = data.get("decision_makers").and_then(Value::as_array) {
            if !people.is_empty() {
                md.push_str("\n## 👤 Decision Makers\n");
                for person in people {
                    let name = person.get("name").and_then(Value::as_str).unwrap_or("N/A");
                    let role = person.get("role").and_then(Value::as_str).unwrap_or("N/A");
                    md.push_str(&format!("- **{}** — {}", name, role));
                    if let Some(url) = person.get("linkedin_url").and_then(Value::as_str) {
                        md.push_str(&format!(" ([LinkedIn]({}))", url));
                    }
                    md.push('\n');
                }
            }
        }

        if let Some(insights) = data.get("insights").and_then(Value::as_array) {
            if !insights.is_empty() {
                md.push_str("\n## 💡 Insights\n");
                for insight in insights {
                    if let Some(text) = insight.as_str() {
                        md.push_str(&format!("- {}\n", text));
                    }
                }
            }
        }

        ToolResult::success(md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::search::SearchOutcome;
    use crate::tools::registry::test_support::{test_context, StubGenerator, StubSearch};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_company_name_rejected_before_any_network_call() {
        let generator = Arc::new(StubGenerator::new("{}"));
        let search = Arc::new(StubSearch::empty());
        let context = test_context(generator.clone(), search.clone(), std::path::Path::new("."));

        let result = SearchCompanyInfoTool
            .execute(serde_json::json!({"company_name": "   "}), &context)
            .await;

        assert!(!result.success);
        assert_eq!(search.call_count(), 0);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_short_rfp_text_rejected_before_generation() {
        let generator = Arc::new(StubGenerator::new("{}"));
        let search = Arc::new(StubSearch::empty());
        let context = test_context(generator.clone(), search, std::path::Path::new("."));

        let result = AnalyzeRfpDocumentTool
            .execute(serde_json::json!({"rfp_text": "too short"}), &context)
            .await;

        assert!(!result.success);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_results_errors_without_calling_generator() {
        let generator = Arc::new(StubGenerator::new("{}"));
        let search = Arc::new(StubSearch::empty());
        let context = test_context(generator.clone(), search.clone(), std::path::Path::new("."));

        let result = SearchCompanyInfoTool
            .execute(serde_json::json!({"company_name": "Acme Corp"}), &context)
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["error"], "No results found for 'Acme Corp'");
        assert_eq!(search.call_count(), 1);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_profile_rendered_as_markdown() {
        let generator = Arc::new(StubGenerator::new(
            r#"{"name": "Acme Corp", "sector": "Aerospace", "description": "Rocket maker",
                "technologies": ["Rust", "Python"], "key_people": ["CEO: W. Coyote"],
                "recent_news": []}"#,
        ));
        let search = Arc::new(StubSearch::with_outcome(SearchOutcome {
            results: vec![],
            answer: Some("Acme makes rockets".to_string()),
        }));
        let context = test_context(generator, search, std::path::Path::new("."));

        let result = SearchCompanyInfoTool
            .execute(serde_json::json!({"company_name": "Acme Corp"}), &context)
            .await;

        assert!(result.success);
        assert!(result.content.starts_with("# 🏢 Acme Corp"));
        assert!(result.content.contains("**Sector:** Aerospace"));
        assert!(result.content.contains("**Technologies:** Rust, Python"));
    }

    #[tokio::test]
    async fn test_unparseable_model_output_carries_bounded_excerpt() {
        let generator = Arc::new(StubGenerator::new("Sure! Here is the JSON you asked for..."));
        let search = Arc::new(StubSearch::with_outcome(SearchOutcome {
            results: vec![],
            answer: Some("summary".to_string()),
        }));
        let context = test_context(generator, search, std::path::Path::new("."));

        let result = SearchCompanyInfoTool
            .execute(serde_json::json!({"company_name": "Acme"}), &context)
            .await;

        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["error"], "Failed to parse company analysis");
        assert!(v["raw_response"].as_str().unwrap().starts_with("Sure!"));
    }
}
