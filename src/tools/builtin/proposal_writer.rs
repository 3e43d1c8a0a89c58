//! Proposal generation tools.
//!
//! The full proposal is produced in a single generation pass over a fixed
//! section template so the narrative stays coherent, then split on an
//! explicit section marker.

use crate::export::docx::export_proposal_to_docx;
use crate::tools::builtin::{format_json_response, parse_failure, ResponseFormat};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

const PROPOSAL_MODEL: &str = "claude-sonnet-4-20250514";
const PROPOSAL_MAX_TOKENS: u32 = 6000;
const TIMELINE_MAX_TOKENS: u32 = 3000;
const SUMMARY_MAX_TOKENS: u32 = 1000;

const SECTION_BREAK: &str = "---SECTION_BREAK---";

const DEFAULT_COMPANY_NAME: &str = "AZA FUTURE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProposalLanguage {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl ProposalLanguage {
    fn name(self) -> &'static str {
        match self {
            ProposalLanguage::English => "English",
            ProposalLanguage::Spanish => "Spanish",
        }
    }

    fn code(self) -> &'static str {
        match self {
            ProposalLanguage::English => "en",
            ProposalLanguage::Spanish => "es",
        }
    }
}

struct SectionTemplate {
    title_en: &'static str,
    title_es: &'static str,
    instruction: &'static str,
}

impl SectionTemplate {
    fn title(&self, language: ProposalLanguage) -> &'static str {
        match language {
            ProposalLanguage::English => self.title_en,
            ProposalLanguage::Spanish => self.title_es,
        }
    }
}

const PROPOSAL_SECTIONS: [SectionTemplate; 8] = [
    SectionTemplate {
        title_en: "Executive Summary",
        title_es: "Resumen Ejecutivo",
        instruction: "Summarize the client's need, the proposed solution, and the expected \
                      impact in a compelling opening. Mention the investment range if pricing \
                      info is available.",
    },
    SectionTemplate {
        title_en: "About Us",
        title_es: "Sobre Nosotros",
        instruction: "Present the consultancy: technology focus, delivery track record, and \
                      the strengths most relevant to this client's sector.",
    },
    SectionTemplate {
        title_en: "Understanding of Your Needs",
        title_es: "Entendimiento de sus Necesidades",
        instruction: "Restate the client's problem and goals in their own terms, showing \
                      command of their context. Reference client research facts when provided.",
    },
    SectionTemplate {
        title_en: "Proposed Solution",
        title_es: "Solución Propuesta",
        instruction: "Describe the technical solution: architecture, main components, \
                      technology choices and why they fit. Be concrete about scope.",
    },
    SectionTemplate {
        title_en: "Methodology & Timeline",
        title_es: "Metodología y Cronograma",
        instruction: "Explain the delivery methodology (agile, sprint cadence, demos) and \
                      give a high-level phase timeline with approximate durations.",
    },
    SectionTemplate {
        title_en: "Team",
        title_es: "Equipo",
        instruction: "Describe the proposed team composition and the role each profile plays \
                      in delivery.",
    },
    SectionTemplate {
        title_en: "Case Studies",
        title_es: "Casos de Éxito",
        instruction: "Present relevant past projects as case studies with measurable \
                      outcomes. Use provided project data when available.",
    },
    SectionTemplate {
        title_en: "Investment & Next Steps",
        title_es: "Inversión y Próximos Pasos",
        instruction: "Present the investment breakdown from the pricing info when available, \
                      payment structure, validity, and a clear call to action.",
    },
];

fn response_format_property() -> PropertySchema {
    PropertySchema::string("Output format: 'markdown' for readable or 'json' for structured")
        .with_default(json!("markdown"))
        .with_enum(&["markdown", "json"])
}

fn language_property() -> PropertySchema {
    PropertySchema::string("Language for the generated text: 'en' or 'es'")
        .with_default(json!("en"))
        .with_enum(&["en", "es"])
}

// ── generate_proposal ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateProposalParams {
    client_name: String,
    project_description: String,
    #[serde(default)]
    client_research: Option<String>,
    #[serde(default)]
    relevant_projects: Option<String>,
    #[serde(default)]
    pricing_info: Option<String>,
    #[serde(default)]
    language: ProposalLanguage,
    #[serde(default)]
    output_format: ResponseFormat,
}

impl GenerateProposalParams {
    fn validate(&mut self) -> Result<(), String> {
        self.client_name = self.client_name.trim().to_string();
        let name_len = self.client_name.chars().count();
        if !(1..=200).contains(&name_len) {
            return Err("client_name must be between 1 and 200 characters".to_string());
        }
        self.project_description = self.project_description.trim().to_string();
        if self.project_description.chars().count() < 10 {
            return Err("project_description must be at least 10 characters".to_string());
        }
        Ok(())
    }
}

pub struct GenerateProposalTool;

#[async_trait]
impl Tool for GenerateProposalTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "client_name".to_string(),
            PropertySchema::string("Name of the client company"),
        );
        properties.insert(
            "project_description".to_string(),
            PropertySchema::string(
                "Description of what the client needs (from RFP analysis or user input)",
            ),
        );
        properties.insert(
            "client_research".to_string(),
            PropertySchema::string("Client research results (company profile, sector, size)"),
        );
        properties.insert(
            "relevant_projects".to_string(),
            PropertySchema::string("Similar past projects to reference as case studies"),
        );
        properties.insert(
            "pricing_info".to_string(),
            PropertySchema::string("Pricing or budget estimation to include"),
        );
        properties.insert("language".to_string(), language_property());
        properties.insert("output_format".to_string(), response_format_property());

        ToolDefinition {
            name: "generate_proposal".to_string(),
            description: "Generate a complete technical and commercial proposal with all \
                          standard sections, enriched with client research, past projects, \
                          and pricing when provided."
                .to_string(),
            input_schema: ToolInputSchema::object(
                properties,
                &["client_name", "project_description"],
            ),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: GenerateProposalParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let lang_name = params.language.name();

        let mut context_parts = vec![
            format!("Client: {}", params.client_name),
            format!("Project: {}", params.project_description),
        ];
        if let Some(research) = &params.client_research {
            context_parts.push(format!("Client Research:\n{}", research));
        }
        if let Some(projects) = &params.relevant_projects {
            context_parts.push(format!("Relevant Past Projects:\n{}", projects));
        }
        if let Some(pricing) = &params.pricing_info {
            context_parts.push(format!("Pricing Information:\n{}", pricing));
        }
        let full_context = context_parts.join("\n\n---\n\n");

        let mut sections_instructions = String::new();
        for (i, section) in PROPOSAL_SECTIONS.iter().enumerate() {
            sections_instructions.push_str(&format!(
                "\n## Section {}: {}\nInstructions: {}\n",
                i + 1,
                section.title(params.language),
                section.instruction
            ));
        }

        let system_prompt = format!(
            "You are a professional proposal writer for a technology consultancy.\n\
             Write a compelling, detailed, and professional proposal in {lang}.\n\n\
             IMPORTANT RULES:\n\
             - Write in {lang} only\n\
             - Be specific and detailed, avoid generic filler text\n\
             - If client research is provided, reference specific facts about the client\n\
             - If past projects are provided, use them as case studies with real data\n\
             - If pricing info is provided, include it in the Investment section\n\
             - If any info is missing, write reasonable placeholder content marked with [TO COMPLETE]\n\
             - Use a professional but warm tone\n\
             - Each section should be substantial (at least 2-3 paragraphs)\n\n\
             Respond with the proposal sections separated by the exact marker: {marker}\n\
             Each section should start with its title as a markdown heading (##).\n\
             Do NOT include any other separators or markers.",
            lang = lang_name,
            marker = SECTION_BREAK,
        );
        let user_content = format!(
            "Generate a proposal with these sections:\n{}\n\nUsing this context:\n\n{}",
            sections_instructions, full_context
        );

        let response = match context
            .generator
            .generate_text(PROPOSAL_MODEL, &system_prompt, &user_content, PROPOSAL_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        let mut sections = Vec::new();
        for (i, raw) in response.split(SECTION_BREAK).enumerate() {
            let content = raw.trim();
            if content.is_empty() {
                continue;
            }
            let title = PROPOSAL_SECTIONS
                .get(i)
                .map(|s| s.title(params.language).to_string())
                .unwrap_or_else(|| format!("Section {}", i + 1));
            sections.push(json!({
                "title": title,
                "content": content,
                "order": i + 1,
            }));
        }

        let project_title = format!("Technical Proposal — {}", params.client_name);
        let generated_at = Utc::now().to_rfc3339();

        if params.output_format == ResponseFormat::Json {
            return ToolResult::proposal(
                format_json_response(&json!({
                    "client_name": params.client_name,
                    "project_title": project_title,
                    "sections": sections,
                    "generated_at": generated_at,
                    "language": params.language.code(),
                    "version": "1.0",
                })),
                params.client_name.clone(),
            );
        }

        let mut md = format!("# 📄 {}\n\n", project_title);
        md.push_str(&format!(
            "*Generated: {} | Language: {} | v1.0*\n\n",
            &generated_at[..10],
            lang_name
        ));
        md.push_str("---\n\n");
        for section in &sections {
            if let Some(content) = section["content"].as_str() {
                md.push_str(content);
                md.push_str("\n\n---\n\n");
            }
        }

        ToolResult::proposal(md, params.client_name.clone())
    }
}

// ── generate_timeline ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TimelinePhase {
    phase_number: u32,
    name: String,
    description: String,
    duration_weeks: u32,
    #[serde(default)]
    deliverables: Vec<String>,
    #[serde(default)]
    dependencies: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct ProjectTimeline {
    total_weeks: u32,
    phases: Vec<TimelinePhase>,
}

#[derive(Debug, Deserialize)]
struct GenerateTimelineParams {
    project_description: String,
    #[serde(default)]
    total_weeks: Option<u32>,
    #[serde(default)]
    language: ProposalLanguage,
    #[serde(default)]
    output_format: ResponseFormat,
}

pub struct GenerateTimelineTool;

#[async_trait]
impl Tool for GenerateTimelineTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "project_description".to_string(),
            PropertySchema::string("Description of the project scope"),
        );
        properties.insert(
            "total_weeks".to_string(),
            PropertySchema::integer(
                "Desired total duration in weeks (2-104). Estimated automatically if omitted.",
            ),
        );
        properties.insert("language".to_string(), language_property());
        properties.insert("output_format".to_string(), response_format_property());

        ToolDefinition {
            name: "generate_timeline".to_string(),
            description: "Generate a project timeline with numbered phases, durations, and \
                          deliverables, rendered as a week-by-week table."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["project_description"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: GenerateTimelineParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        params.project_description = params.project_description.trim().to_string();
        if params.project_description.chars().count() < 10 {
            return ToolResult::error("project_description must be at least 10 characters".to_string());
        }
        if let Some(weeks) = params.total_weeks {
            if !(2..=104).contains(&weeks) {
                return ToolResult::error("total_weeks must be between 2 and 104".to_string());
            }
        }

        let weeks_instruction = match params.total_weeks {
            Some(weeks) => format!(
                "The total project duration should be approximately {} weeks.",
                weeks
            ),
            None => "Estimate a reasonable total duration based on project complexity.".to_string(),
        };

        let system_prompt = format!(
            "You are a project planning expert. Generate a detailed project timeline\n\
             in {}. {}\n\n\
             Respond ONLY with a valid JSON object:\n\
             {{\n\
             \x20   \"total_weeks\": <number>,\n\
             \x20   \"phases\": [\n\
             \x20       {{\n\
             \x20           \"phase_number\": 1,\n\
             \x20           \"name\": \"Phase name\",\n\
             \x20           \"description\": \"What happens in this phase\",\n\
             \x20           \"duration_weeks\": <number>,\n\
             \x20           \"deliverables\": [\"deliverable 1\", \"deliverable 2\"],\n\
             \x20           \"dependencies\": []\n\
             \x20       }}\n\
             \x20   ]\n\
             }}\n\n\
             Include typical phases: Discovery/Planning, Design, Development (split into \
             sprints if >4 weeks),\nTesting/QA, Deployment, and Post-launch Support.\n\
             Do NOT include markdown backticks. Return ONLY the JSON.",
            params.language.name(),
            weeks_instruction,
        );

        let response = match context
            .generator
            .generate_text(
                PROPOSAL_MODEL,
                &system_prompt,
                &format!("Generate a timeline for:\n{}", params.project_description),
                TIMELINE_MAX_TOKENS,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        let timeline: ProjectTimeline = match serde_json::from_str(response.trim()) {
            Ok(t) => t,
            Err(_) => {
                return ToolResult::success(parse_failure("Failed to parse timeline", &response))
            }
        };

        if params.output_format == ResponseFormat::Json {
            let phases: Vec<Value> = timeline
                .phases
                .iter()
                .map(|p| {
                    json!({
                        "phase_number": p.phase_number,
                        "name": p.name,
                        "description": p.description,
                        "duration_weeks": p.duration_weeks,
                        "deliverables": p.deliverables,
                        "dependencies": p.dependencies,
                    })
                })
                .collect();
            return ToolResult::success(format_json_response(&json!({
                "total_weeks": timeline.total_weeks,
                "phases": phases,
            })));
        }

        let mut md = "# 📅 Project Timeline\n\n".to_string();
        md.push_str(&format!("**Total Duration:** {} weeks\n\n", timeline.total_weeks));
        md.push_str("| Phase | Name | Duration | Deliverables |\n");
        md.push_str("|-------|------|----------|-------------|\n");

        let mut week_counter = 0;
        for phase in &timeline.phases {
            let week_start = week_counter + 1;
            let week_end = week_counter + phase.duration_weeks;
            week_counter = week_end;
            let deliverables: Vec<&str> = phase
                .deliverables
                .iter()
                .take(3)
                .map(String::as_str)
                .collect();
            md.push_str(&format!(
                "| {} | **{}** | W{}-W{} ({}w) | {} |\n",
                phase.phase_number,
                phase.name,
                week_start,
                week_end,
                phase.duration_weeks,
                deliverables.join(", ")
            ));
        }

        md.push('\n');
        for phase in &timeline.phases {
            md.push_str(&format!("\n### Phase {}: {}\n", phase.phase_number, phase.name));
            md.push_str(&format!("{}\n\n", phase.description));
            md.push_str("**Deliverables:**\n");
            for d in &phase.deliverables {
                md.push_str(&format!("- {}\n", d));
            }
        }

        ToolResult::success(md)
    }
}

// ── generate_executive_summary ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExecutiveSummaryParams {
    full_proposal: String,
    #[serde(default = "default_max_words")]
    max_words: u32,
    #[serde(default)]
    language: ProposalLanguage,
    #[serde(default)]
    output_format: ResponseFormat,
}

fn default_max_words() -> u32 {
    300
}

pub struct GenerateExecutiveSummaryTool;

#[async_trait]
impl Tool for GenerateExecutiveSummaryTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "full_proposal".to_string(),
            PropertySchema::string("The full proposal text to summarize"),
        );
        properties.insert(
            "max_words".to_string(),
            PropertySchema::integer("Maximum word count for the summary (50-1000)")
                .with_default(json!(300)),
        );
        properties.insert("language".to_string(), language_property());
        properties.insert("output_format".to_string(), response_format_property());

        ToolDefinition {
            name: "generate_executive_summary".to_string(),
            description: "Generate a concise executive summary from a full proposal, \
                          covering need, solution, track record, and call to action."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["full_proposal"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: ExecutiveSummaryParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        params.full_proposal = params.full_proposal.trim().to_string();
        if params.full_proposal.chars().count() < 50 {
            return ToolResult::error("full_proposal must be at least 50 characters".to_string());
        }
        if !(50..=1000).contains(&params.max_words) {
            return ToolResult::error("max_words must be between 50 and 1000".to_string());
        }

        let system_prompt = format!(
            "You are an expert at writing executive summaries for technical proposals.\n\
             Write in {}. Maximum {} words.\n\n\
             The summary must:\n\
             - Open with the client's core need\n\
             - Highlight the proposed solution and its key differentiators\n\
             - Mention relevant experience/track record\n\
             - Include expected outcomes or ROI\n\
             - End with a clear call to action\n\n\
             Be compelling and concise. Every sentence must earn its place.",
            params.language.name(),
            params.max_words,
        );

        let response = match context
            .generator
            .generate_text(
                PROPOSAL_MODEL,
                &system_prompt,
                &format!(
                    "Write an executive summary for this proposal:\n\n{}",
                    params.full_proposal
                ),
                SUMMARY_MAX_TOKENS,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolResult::success(e.message),
        };

        if params.output_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(&json!({
                "executive_summary": response.trim(),
                "language": params.language.code(),
                "word_count": response.split_whitespace().count(),
            })));
        }

        ToolResult::success(format!("# 📋 Executive Summary\n\n{}", response.trim()))
    }
}

// ── export_proposal_docx ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExportDocxParams {
    proposal_markdown: String,
    client_name: String,
    #[serde(default = "default_project_title")]
    project_title: String,
    #[serde(default = "default_company_name")]
    company_name: String,
}

fn default_project_title() -> String {
    "Technical Proposal".to_string()
}

fn default_company_name() -> String {
    DEFAULT_COMPANY_NAME.to_string()
}

pub struct ExportProposalDocxTool;

#[async_trait]
impl Tool for ExportProposalDocxTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "proposal_markdown".to_string(),
            PropertySchema::string(
                "The full proposal in markdown format (output from generate_proposal)",
            ),
        );
        properties.insert(
            "client_name".to_string(),
            PropertySchema::string("Client company name (used in cover page and headers)"),
        );
        properties.insert(
            "project_title".to_string(),
            PropertySchema::string("Title for the cover page")
                .with_default(json!("Technical Proposal")),
        );
        properties.insert(
            "company_name".to_string(),
            PropertySchema::string("Company name for branding on cover page and headers")
                .with_default(json!(DEFAULT_COMPANY_NAME)),
        );

        ToolDefinition {
            name: "export_proposal_docx".to_string(),
            description: "Export a markdown proposal to a professional DOCX file with cover \
                          page, styled headings, tables, headers, and page numbers."
                .to_string(),
            input_schema: ToolInputSchema::object(
                properties,
                &["proposal_markdown", "client_name"],
            ),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: ExportDocxParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        params.client_name = params.client_name.trim().to_string();
        let name_len = params.client_name.chars().count();
        if !(1..=200).contains(&name_len) {
            return ToolResult::error("client_name must be between 1 and 200 characters".to_string());
        }
        if params.proposal_markdown.trim().chars().count() < 50 {
            return ToolResult::error("proposal_markdown must be at least 50 characters".to_string());
        }

        match export_proposal_to_docx(
            &params.proposal_markdown,
            &params.client_name,
            &params.project_title,
            &params.company_name,
            &context.export_dir,
        ) {
            Ok(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ToolResult::success(format_json_response(&json!({
                    "status": "success",
                    "message": "Proposal exported to DOCX successfully",
                    "file_path": path.to_string_lossy(),
                    "file_name": file_name,
                })))
            }
            Err(e) => ToolResult::error(format!("DOCX export failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::test_support::{test_context, StubGenerator, StubSearch};
    use crate::tools::types::ToolResultKind;
    use std::sync::Arc;

    fn context_with(dir: &tempfile::TempDir, response: &str) -> ToolContext {
        test_context(
            Arc::new(StubGenerator::new(response)),
            Arc::new(StubSearch::empty()),
            dir.path(),
        )
    }

    #[tokio::test]
    async fn test_generate_proposal_is_tagged_with_client_name() {
        let dir = tempfile::tempdir().unwrap();
        let response = format!(
            "## Executive Summary\nOpening.\n{}\n## About Us\nWho we are.",
            SECTION_BREAK
        );
        let result = GenerateProposalTool
            .execute(
                json!({"client_name": "Acme Corp",
                       "project_description": "A booking platform for clinics"}),
                &context_with(&dir, &response),
            )
            .await;

        assert!(result.success);
        assert_eq!(
            result.kind,
            ToolResultKind::Proposal {
                client_name: "Acme Corp".to_string()
            }
        );
        assert!(result.content.starts_with("# 📄 Technical Proposal — Acme Corp"));
        assert!(result.content.contains("## Executive Summary"));
        assert!(result.content.contains("## About Us"));
        assert!(!result.content.contains(SECTION_BREAK));
    }

    #[tokio::test]
    async fn test_proposal_json_carries_ordered_sections() {
        let dir = tempfile::tempdir().unwrap();
        let response = format!("First section.\n{}\nSecond section.", SECTION_BREAK);
        let result = GenerateProposalTool
            .execute(
                json!({"client_name": "Acme", "project_description": "Platform rebuild work",
                       "output_format": "json"}),
                &context_with(&dir, &response),
            )
            .await;

        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["sections"][0]["title"], "Executive Summary");
        assert_eq!(v["sections"][0]["order"], 1);
        assert_eq!(v["sections"][1]["title"], "About Us");
        assert_eq!(v["language"], "en");
    }

    #[tokio::test]
    async fn test_timeline_table_tracks_week_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let response = json!({
            "total_weeks": 6,
            "phases": [
                {"phase_number": 1, "name": "Discovery", "description": "Scoping",
                 "duration_weeks": 2, "deliverables": ["Backlog"], "dependencies": []},
                {"phase_number": 2, "name": "Development", "description": "Build",
                 "duration_weeks": 4, "deliverables": ["MVP", "Docs"], "dependencies": [1]}
            ]
        })
        .to_string();
        let result = GenerateTimelineTool
            .execute(
                json!({"project_description": "Internal analytics dashboard"}),
                &context_with(&dir, &response),
            )
            .await;

        assert!(result.success);
        assert!(result.content.contains("**Total Duration:** 6 weeks"));
        assert!(result.content.contains("| 1 | **Discovery** | W1-W2 (2w) | Backlog |"));
        assert!(result.content.contains("| 2 | **Development** | W3-W6 (4w) | MVP, Docs |"));
    }

    #[tokio::test]
    async fn test_unparseable_timeline_reports_bounded_excerpt() {
        let dir = tempfile::tempdir().unwrap();
        let result = GenerateTimelineTool
            .execute(
                json!({"project_description": "Internal analytics dashboard"}),
                &context_with(&dir, "here is your timeline: week one..."),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["error"], "Failed to parse timeline");
    }

    #[tokio::test]
    async fn test_executive_summary_counts_words() {
        let dir = tempfile::tempdir().unwrap();
        let result = GenerateExecutiveSummaryTool
            .execute(
                json!({"full_proposal": "x".repeat(60), "output_format": "json"}),
                &context_with(&dir, "Five words in this summary"),
            )
            .await;

        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["word_count"], 5);
        assert_eq!(v["language"], "en");
    }

    #[tokio::test]
    async fn test_short_proposal_rejected_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(StubGenerator::new(""));
        let context = test_context(generator.clone(), Arc::new(StubSearch::empty()), dir.path());
        let result = GenerateExecutiveSummaryTool
            .execute(json!({"full_proposal": "too short"}), &context)
            .await;

        assert!(!result.success);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_export_writes_docx_and_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let markdown = "# 📄 Technical Proposal — Acme Corp\n\nA proposal body long enough to export.";
        let result = ExportProposalDocxTool
            .execute(
                json!({"proposal_markdown": markdown, "client_name": "Acme Corp"}),
                &context_with(&dir, ""),
            )
            .await;

        assert!(result.success, "{:?}", result.error);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["status"], "success");
        let file_name = v["file_name"].as_str().unwrap();
        assert!(file_name.starts_with("proposal_acme_corp_"));
        assert!(file_name.ends_with(".docx"));
        assert!(dir.path().join("exports").join(file_name).exists());
    }
}
