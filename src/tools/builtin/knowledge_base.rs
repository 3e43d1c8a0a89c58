//! Knowledge base tools over the local project store.
//!
//! Keyword matching narrows candidates, then the model ranks them by
//! semantic relevance. Ranking failures fall back to keyword order so the
//! store stays usable without the generative backend.

use crate::tools::builtin::{format_json_response, group_thousands, ResponseFormat};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const RANKING_MODEL: &str = "claude-haiku-4-5-20251001";
const RANKING_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    pub name: String,
    pub client: String,
    #[serde(default)]
    pub sector: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub team_size: u32,
    #[serde(default)]
    pub duration_weeks: u32,
    #[serde(default)]
    pub total_hours: i64,
    #[serde(default)]
    pub budget_eur: i64,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ProjectSummary {
    project_id: String,
    name: String,
    client: String,
    sector: String,
    description: String,
    tech_stack: Vec<String>,
    year: u32,
    relevance_score: f64,
}

/// Load the project store. A missing file means an empty knowledge base,
/// not a fault.
fn load_projects(data_dir: &Path) -> Result<Vec<ProjectRecord>, String> {
    let path = data_dir.join("projects.json");
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn keyword_score(project: &ProjectRecord, query_terms: &[String]) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let searchable = format!(
        "{} {} {} {} {} {} {}",
        project.name,
        project.description,
        project.sector,
        project.outcome,
        project.tags.join(" "),
        project.tech_stack.join(" "),
        project.key_features.join(" "),
    )
    .to_lowercase();

    let matches = query_terms
        .iter()
        .filter(|term| searchable.contains(term.as_str()))
        .count();
    (matches as f64 * 100.0 / query_terms.len() as f64).round() / 100.0
}

/// Rank candidates by semantic relevance. Any failure returns the input
/// order unchanged.
async fn rank_with_model(
    context: &ToolContext,
    query: &str,
    mut candidates: Vec<(ProjectRecord, f64)>,
) -> Vec<(ProjectRecord, f64)> {
    if candidates.is_empty() {
        return candidates;
    }

    let summaries: Vec<Value> = candidates
        .iter()
        .map(|(p, _)| {
            json!({
                "project_id": p.project_id,
                "name": p.name,
                "sector": p.sector,
                "description": p.description,
                "tags": p.tags,
            })
        })
        .collect();

    let system = "You are a project matching engine. Given a query and a list of projects, \
                  return a JSON array of project_ids sorted by relevance (most relevant first). \
                  Include a relevance_score (0.0 to 1.0) for each. Respond ONLY with a JSON \
                  array like: [{\"project_id\": \"PRJ-001\", \"relevance_score\": 0.95}]. \
                  No markdown backticks.";
    let prompt = format!(
        "Query: {}\n\nProjects:\n{}",
        query,
        serde_json::to_string_pretty(&summaries).unwrap_or_default()
    );

    let raw = match context
        .generator
        .generate_text(RANKING_MODEL, system, &prompt, RANKING_MAX_TOKENS)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            log::warn!("[knowledge_base] Ranking unavailable, using keyword order: {}", e);
            return candidates;
        }
    };

    #[derive(Deserialize)]
    struct Ranking {
        project_id: String,
        relevance_score: f64,
    }

    let rankings: Vec<Ranking> = match serde_json::from_str(raw.trim()) {
        Ok(r) => r,
        Err(_) => return candidates,
    };

    let score_map: HashMap<String, f64> = rankings
        .into_iter()
        .map(|r| (r.project_id, r.relevance_score))
        .collect();
    for (project, score) in candidates.iter_mut() {
        *score = *score_map.get(&project.project_id).unwrap_or(&0.0);
    }
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

/// Shared search routine behind `search_past_projects` and `get_case_studies`.
async fn run_project_search(
    context: &ToolContext,
    query: &str,
    sector: Option<&str>,
    max_results: usize,
    response_format: ResponseFormat,
) -> ToolResult {
    let projects = match load_projects(&context.data_dir) {
        Ok(p) => p,
        Err(e) => return ToolResult::error(e),
    };
    if projects.is_empty() {
        return ToolResult::success(format_json_response(&json!({
            "error": "Knowledge base is empty",
            "suggestion": "Add projects to data/projects.json",
        })));
    }

    let filtered: Vec<ProjectRecord> = match sector {
        Some(sector) => {
            let sector_lower = sector.to_lowercase();
            projects
                .into_iter()
                .filter(|p| p.sector.to_lowercase().contains(&sector_lower))
                .collect()
        }
        None => projects,
    };

    let query_terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect();

    let scored: Vec<(ProjectRecord, f64)> = filtered
        .into_iter()
        .map(|p| {
            let score = keyword_score(&p, &query_terms);
            (p, score)
        })
        .collect();

    let matched: Vec<(ProjectRecord, f64)> = scored
        .iter()
        .filter(|(_, score)| *score > 0.0)
        .cloned()
        .collect();
    let candidates = if matched.is_empty() { scored } else { matched };

    let ranked = rank_with_model(context, query, candidates).await;
    let top: Vec<(ProjectRecord, f64)> = ranked.into_iter().take(max_results).collect();

    if top.is_empty() {
        return ToolResult::success(format_json_response(&json!({
            "message": "No matching projects found",
            "query": query,
            "suggestion": "Try broader search terms",
        })));
    }

    let summaries: Vec<ProjectSummary> = top
        .iter()
        .map(|(p, score)| ProjectSummary {
            project_id: p.project_id.clone(),
            name: p.name.clone(),
            client: p.client.clone(),
            sector: if p.sector.is_empty() {
                "N/A".to_string()
            } else {
                p.sector.clone()
            },
            description: p.description.clone(),
            tech_stack: p.tech_stack.clone(),
            year: p.year,
            relevance_score: *score,
        })
        .collect();

    if response_format == ResponseFormat::Json {
        return ToolResult::success(format_json_response(&json!({
            "query": query,
            "total_found": summaries.len(),
            "projects": summaries,
        })));
    }

    let mut md = format!("# 🔍 Projects matching: \"{}\"\n\n", query);
    md.push_str(&format!(
        "Found **{}** relevant project(s):\n\n",
        summaries.len()
    ));
    for s in &summaries {
        let score_pct = (s.relevance_score * 100.0) as i64;
        md.push_str(&format!("---\n### {} ({})\n", s.name, s.project_id));
        md.push_str(&format!(
            "**Client:** {} | **Sector:** {} | **Year:** {}\n",
            s.client, s.sector, s.year
        ));
        md.push_str(&format!("**Relevance:** {}%\n\n", score_pct));
        md.push_str(&format!("{}\n\n", s.description));
        md.push_str(&format!("**Tech:** {}\n\n", s.tech_stack.join(", ")));
    }
    md.push_str("\n💡 Use `get_project_details` with a project ID for full information.");

    ToolResult::success(md)
}

fn response_format_property() -> PropertySchema {
    PropertySchema::string("Output format: 'markdown' for readable or 'json' for structured")
        .with_default(json!("markdown"))
        .with_enum(&["markdown", "json"])
}

// ── search_past_projects ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchProjectsParams {
    query: String,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default)]
    response_format: ResponseFormat,
}

fn default_max_results() -> usize {
    3
}

impl SearchProjectsParams {
    fn validate(&mut self) -> Result<(), String> {
        self.query = self.query.trim().to_string();
        let len = self.query.chars().count();
        if !(2..=500).contains(&len) {
            return Err("query must be between 2 and 500 characters".to_string());
        }
        if !(1..=10).contains(&self.max_results) {
            return Err("max_results must be between 1 and 10".to_string());
        }
        Ok(())
    }
}

pub struct SearchPastProjectsTool;

#[async_trait]
impl Tool for SearchPastProjectsTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            PropertySchema::string("Search query (keywords, sector, or requirements)"),
        );
        properties.insert(
            "sector".to_string(),
            PropertySchema::string("Optional sector filter (e.g., 'fintech', 'healthcare')"),
        );
        properties.insert(
            "max_results".to_string(),
            PropertySchema::integer("Maximum number of projects to return (1-10)")
                .with_default(json!(3)),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "search_past_projects".to_string(),
            description: "Search internal past projects by keywords with AI-powered relevance \
                          ranking. Returns the most relevant project summaries."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["query"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: SearchProjectsParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }
        run_project_search(
            context,
            &params.query,
            params.sector.as_deref(),
            params.max_results,
            params.response_format,
        )
        .await
    }
}

// ── get_project_details ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProjectDetailsParams {
    project_id: String,
    #[serde(default)]
    response_format: ResponseFormat,
}

pub struct GetProjectDetailsTool;

#[async_trait]
impl Tool for GetProjectDetailsTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "project_id".to_string(),
            PropertySchema::string("Project identifier (e.g., 'PRJ-001')"),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "get_project_details".to_string(),
            description: "Get full details of a specific past project by its ID, including \
                          metrics, outcome, key features, and challenges."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["project_id"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: ProjectDetailsParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        params.project_id = params.project_id.trim().to_string();
        if params.project_id.is_empty() {
            return ToolResult::error("project_id must not be empty".to_string());
        }

        let projects = match load_projects(&context.data_dir) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let wanted = params.project_id.to_uppercase();
        let project = projects.iter().find(|p| p.project_id.to_uppercase() == wanted);

        let Some(detail) = project else {
            let available: Vec<&str> = projects.iter().map(|p| p.project_id.as_str()).collect();
            return ToolResult::success(format_json_response(&json!({
                "error": format!("Project '{}' not found", params.project_id),
                "available_ids": available,
            })));
        };

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(
                &serde_json::to_value(detail).unwrap_or(Value::Null),
            ));
        }

        let mut md = format!("# 📋 {}\n\n", detail.name);
        md.push_str(&format!(
            "**ID:** {} | **Status:** {}\n",
            detail.project_id, detail.status
        ));
        md.push_str(&format!(
            "**Client:** {} | **Sector:** {} | **Year:** {}\n\n",
            detail.client, detail.sector, detail.year
        ));
        md.push_str(&format!("## Description\n{}\n\n", detail.description));
        md.push_str("## Metrics\n");
        md.push_str(&format!("- **Team Size:** {} people\n", detail.team_size));
        md.push_str(&format!("- **Duration:** {} weeks\n", detail.duration_weeks));
        md.push_str(&format!(
            "- **Total Hours:** {}h\n",
            group_thousands(detail.total_hours)
        ));
        md.push_str(&format!(
            "- **Budget:** €{}\n\n",
            group_thousands(detail.budget_eur)
        ));
        md.push_str(&format!("## Outcome\n{}\n\n", detail.outcome));
        md.push_str("## Key Features\n");
        for feature in &detail.key_features {
            md.push_str(&format!("- {}\n", feature));
        }
        md.push_str(&format!("\n## Tech Stack\n{}\n\n", detail.tech_stack.join(", ")));
        md.push_str("## Challenges\n");
        for challenge in &detail.challenges {
            md.push_str(&format!("- {}\n", challenge));
        }

        ToolResult::success(md)
    }
}

// ── search_tech_stack ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TechStackParams {
    technologies: Vec<String>,
    #[serde(default)]
    match_all: bool,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl TechStackParams {
    fn validate(&self) -> Result<(), String> {
        if self.technologies.is_empty() || self.technologies.len() > 10 {
            return Err("technologies must contain between 1 and 10 items".to_string());
        }
        Ok(())
    }
}

pub struct SearchTechStackTool;

#[async_trait]
impl Tool for SearchTechStackTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "technologies".to_string(),
            PropertySchema::string_array("Technologies to search for (e.g., ['React', 'Python'])"),
        );
        properties.insert(
            "match_all".to_string(),
            PropertySchema::boolean("Require all technologies to match instead of any")
                .with_default(json!(false)),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "search_tech_stack".to_string(),
            description: "Find past projects that used specific technologies. Matches any of \
                          the given technologies by default, or all of them with match_all."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["technologies"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: TechStackParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let projects = match load_projects(&context.data_dir) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let search_techs: HashSet<String> = params
            .technologies
            .iter()
            .map(|t| t.to_lowercase())
            .collect();

        let mut results: Vec<(&ProjectRecord, usize)> = Vec::new();
        for project in &projects {
            let project_techs: HashSet<String> =
                project.tech_stack.iter().map(|t| t.to_lowercase()).collect();
            let matched = search_techs.intersection(&project_techs).count();

            if params.match_all && matched == search_techs.len() {
                results.push((project, matched));
            } else if !params.match_all && matched > 0 {
                results.push((project, matched));
            }
        }
        results.sort_by(|a, b| b.1.cmp(&a.1));

        if results.is_empty() {
            return ToolResult::success(format_json_response(&json!({
                "message": format!(
                    "No projects found with technologies: {:?}",
                    params.technologies
                ),
                "match_mode": if params.match_all { "all" } else { "any" },
            })));
        }

        if params.response_format == ResponseFormat::Json {
            let entries: Vec<Value> = results
                .iter()
                .map(|(p, count)| {
                    json!({
                        "project_id": p.project_id,
                        "name": p.name,
                        "tech_stack": p.tech_stack,
                        "matched_count": count,
                    })
                })
                .collect();
            return ToolResult::success(format_json_response(&json!({
                "technologies_searched": params.technologies,
                "match_all": params.match_all,
                "results": entries,
            })));
        }

        let mode = if params.match_all { "ALL of" } else { "any of" };
        let mut md = format!(
            "# 🛠️ Projects using {}: {}\n\n",
            mode,
            params.technologies.join(", ")
        );
        for (p, count) in &results {
            md.push_str(&format!("### {} ({})\n", p.name, p.project_id));
            md.push_str(&format!(
                "**Matches:** {}/{} technologies\n",
                count,
                params.technologies.len()
            ));
            md.push_str(&format!("**Full Stack:** {}\n\n", p.tech_stack.join(", ")));
        }

        ToolResult::success(md)
    }
}

// ── get_case_studies ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CaseStudiesParams {
    client_sector: String,
    #[serde(default)]
    project_type: Option<String>,
    #[serde(default)]
    response_format: ResponseFormat,
}

pub struct GetCaseStudiesTool;

#[async_trait]
impl Tool for GetCaseStudiesTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "client_sector".to_string(),
            PropertySchema::string("The client's sector (e.g., 'healthcare', 'fintech')"),
        );
        properties.insert(
            "project_type".to_string(),
            PropertySchema::string("Optional project type (e.g., 'mobile app', 'data platform')"),
        );
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "get_case_studies".to_string(),
            description: "Find case studies relevant to a client's sector and project type, \
                          usable as social proof in a proposal."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["client_sector"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: CaseStudiesParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        params.client_sector = params.client_sector.trim().to_string();
        if params.client_sector.chars().count() < 2 {
            return ToolResult::error("client_sector must be at least 2 characters".to_string());
        }

        let mut query = params.client_sector.clone();
        if let Some(project_type) = &params.project_type {
            query.push(' ');
            query.push_str(project_type);
        }

        run_project_search(context, &query, None, 3, params.response_format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::test_support::{test_context, StubGenerator, StubSearch};
    use std::io::Write;
    use std::sync::Arc;

    const STORE: &str = r#"[
        {
            "project_id": "PRJ-001",
            "name": "FoodRush Delivery Platform",
            "client": "FoodRush",
            "sector": "food delivery",
            "description": "Real-time delivery platform with rider tracking",
            "tech_stack": ["React", "Python", "PostgreSQL"],
            "year": 2023,
            "status": "completed",
            "team_size": 6,
            "duration_weeks": 24,
            "total_hours": 3800,
            "budget_eur": 290000,
            "outcome": "Cut average delivery time by 18%",
            "key_features": ["Live tracking", "Dynamic dispatch"],
            "challenges": ["Peak-hour load spikes"],
            "tags": ["marketplace", "mobile"]
        },
        {
            "project_id": "PRJ-002",
            "name": "MediTrack Patient Portal",
            "client": "MediTrack",
            "sector": "healthcare",
            "description": "Patient portal with appointment scheduling",
            "tech_stack": ["React", "Node.js"],
            "year": 2024,
            "status": "completed",
            "team_size": 4,
            "duration_weeks": 16,
            "total_hours": 2100,
            "budget_eur": 160000,
            "outcome": "Reduced no-shows by 25%",
            "key_features": ["Scheduling", "Reminders"],
            "challenges": ["HIPAA-equivalent compliance"],
            "tags": ["portal", "health"]
        }
    ]"#;

    fn store_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("projects.json")).unwrap();
        file.write_all(STORE.as_bytes()).unwrap();
        dir
    }

    fn context(dir: &tempfile::TempDir) -> ToolContext {
        test_context(
            Arc::new(StubGenerator::new("not json, ranking falls back")),
            Arc::new(StubSearch::empty()),
            dir.path(),
        )
    }

    #[tokio::test]
    async fn test_match_all_returns_single_project_with_matched_count() {
        let dir = store_dir();
        let result = SearchTechStackTool
            .execute(
                json!({"technologies": ["React", "Python"], "match_all": true,
                       "response_format": "json"}),
                &context(&dir),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        let entries = v["results"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["project_id"], "PRJ-001");
        assert_eq!(entries[0]["matched_count"], 2);
    }

    #[tokio::test]
    async fn test_match_any_includes_both_projects() {
        let dir = store_dir();
        let result = SearchTechStackTool
            .execute(
                json!({"technologies": ["React", "Python"], "response_format": "json"}),
                &context(&dir),
            )
            .await;

        let v: Value = serde_json::from_str(&result.content).unwrap();
        let entries = v["results"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        // Best match first.
        assert_eq!(entries[0]["project_id"], "PRJ-001");
    }

    #[tokio::test]
    async fn test_unknown_project_id_lists_available_ids() {
        let dir = store_dir();
        let result = GetProjectDetailsTool
            .execute(json!({"project_id": "PRJ-999"}), &context(&dir))
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["error"], "Project 'PRJ-999' not found");
        assert_eq!(v["available_ids"], json!(["PRJ-001", "PRJ-002"]));
    }

    #[tokio::test]
    async fn test_project_id_lookup_is_case_insensitive() {
        let dir = store_dir();
        let result = GetProjectDetailsTool
            .execute(json!({"project_id": "prj-002"}), &context(&dir))
            .await;

        assert!(result.content.contains("MediTrack Patient Portal"));
        assert!(result.content.contains("**Total Hours:** 2,100h"));
    }

    #[tokio::test]
    async fn test_missing_store_is_empty_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = SearchPastProjectsTool
            .execute(json!({"query": "delivery platform"}), &context(&dir))
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["error"], "Knowledge base is empty");
    }

    #[tokio::test]
    async fn test_search_falls_back_to_keyword_order_when_ranking_unparseable() {
        let dir = store_dir();
        let result = SearchPastProjectsTool
            .execute(
                json!({"query": "delivery rider tracking", "response_format": "json"}),
                &context(&dir),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["projects"][0]["project_id"], "PRJ-001");
    }

    #[tokio::test]
    async fn test_query_length_validated_before_store_access() {
        let dir = store_dir();
        let result = SearchPastProjectsTool
            .execute(json!({"query": "x"}), &context(&dir))
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_case_studies_filter_by_sector_query() {
        let dir = store_dir();
        let result = GetCaseStudiesTool
            .execute(
                json!({"client_sector": "healthcare", "response_format": "json"}),
                &context(&dir),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["projects"][0]["project_id"], "PRJ-002");
    }
}
