//! Pricing tools backed by the rate card store.
//!
//! Scope analysis delegates team composition to the model, then the cost
//! arithmetic (complexity multiplier, phase split, discount) runs locally
//! against rate_card.json.

use crate::tools::builtin::{format_json_response, group_thousands, titleize, ResponseFormat};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use strum::{Display, EnumIter, IntoEnumIterator};

const ANALYSIS_MODEL: &str = "claude-haiku-4-5-20251001";
const ANALYSIS_MAX_TOKENS: u32 = 1500;

const DEFAULT_HOURLY_RATE: i64 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountTier {
    #[default]
    Standard,
    LongTerm,
    Strategic,
}

// ── Rate card ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct RoleInfo {
    role_id: String,
    title: String,
    hourly_rate: i64,
    #[serde(default)]
    typical_allocation_pct: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PhaseInfo {
    phase: String,
    description: String,
    pct_of_total: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct RateCard {
    currency: String,
    roles: Vec<RoleInfo>,
    complexity_multipliers: HashMap<String, f64>,
    discount_tiers: HashMap<String, i64>,
    #[serde(default)]
    phase_distribution: Vec<PhaseInfo>,
}

impl RateCard {
    fn role(&self, role_id: &str) -> Option<&RoleInfo> {
        self.roles.iter().find(|r| r.role_id == role_id)
    }

    fn multiplier(&self, complexity: Complexity) -> f64 {
        *self
            .complexity_multipliers
            .get(&complexity.to_string())
            .unwrap_or(&1.0)
    }

    fn discount_pct(&self, tier: DiscountTier) -> i64 {
        *self.discount_tiers.get(&tier.to_string()).unwrap_or(&0)
    }
}

fn rate_card_path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join("rate_card.json")
}

fn load_rate_card(data_dir: &Path) -> Result<RateCard, String> {
    let path = rate_card_path(data_dir);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

// ── Scope analysis ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScopeRole {
    role_id: String,
    hours: i64,
    #[serde(default)]
    justification: String,
}

#[derive(Debug, Deserialize)]
struct ScopeAnalysis {
    #[serde(default = "default_weeks")]
    estimated_weeks: u32,
    #[serde(default)]
    roles: Vec<ScopeRole>,
    #[serde(default)]
    assumptions: Vec<String>,
    #[serde(default)]
    risks: Vec<String>,
}

fn default_weeks() -> u32 {
    12
}

const SCOPE_SYSTEM_PROMPT: &str = r#"You are an expert software project estimator.
Analyze the project description and estimate the required team and hours.

Available role IDs: pm, tech_lead, backend_dev, frontend_dev, mobile_dev, ml_engineer, designer, qa, devops

Respond ONLY with a valid JSON object:
{
    "estimated_weeks": <number>,
    "roles": [
        {"role_id": "<role_id>", "hours": <number>, "justification": "brief reason"}
    ],
    "assumptions": ["list of key assumptions"],
    "risks": ["cost risks to flag"]
}

Be realistic. Not every project needs every role. A simple web app might need
4-5 roles while a complex ML platform might need 7-8.
Do NOT include markdown backticks. Return ONLY the JSON."#;

/// Fallback used when scope analysis is unavailable or unparseable. A
/// generic medium-sized team keeps the estimate flowing.
fn fallback_analysis() -> ScopeAnalysis {
    ScopeAnalysis {
        estimated_weeks: 12,
        roles: vec![
            ScopeRole { role_id: "pm".into(), hours: 60, justification: "Project coordination".into() },
            ScopeRole { role_id: "tech_lead".into(), hours: 80, justification: "Architecture".into() },
            ScopeRole { role_id: "backend_dev".into(), hours: 300, justification: "Core development".into() },
            ScopeRole { role_id: "frontend_dev".into(), hours: 250, justification: "UI implementation".into() },
            ScopeRole { role_id: "qa".into(), hours: 100, justification: "Testing".into() },
            ScopeRole { role_id: "devops".into(), hours: 60, justification: "Deployment".into() },
        ],
        assumptions: vec!["Fallback estimate, scope analysis unavailable".to_string()],
        risks: vec!["Estimate may not reflect actual project scope".to_string()],
    }
}

async fn analyze_scope(context: &ToolContext, project_description: &str) -> ScopeAnalysis {
    let prompt = format!("Estimate this project:\n{}", project_description);
    let raw = match context
        .generator
        .generate_text(ANALYSIS_MODEL, SCOPE_SYSTEM_PROMPT, &prompt, ANALYSIS_MAX_TOKENS)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            log::warn!("[pricing] Scope analysis unavailable, using fallback: {}", e);
            return fallback_analysis();
        }
    };
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| fallback_analysis())
}

// ── Shared arithmetic ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
struct RoleEstimate {
    role_id: String,
    title: String,
    hours: i64,
    hourly_rate: i64,
    subtotal: f64,
}

#[derive(Debug, Clone, Serialize)]
struct PhaseEstimate {
    phase: String,
    description: String,
    pct_of_total: i64,
    hours: i64,
    cost: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn euros(x: f64) -> String {
    group_thousands(x.round() as i64)
}

fn role_table(rows: &[RoleEstimate], total_hours: i64, total_cost: f64) -> String {
    let mut md = String::new();
    md.push_str("| Role | Hours | Rate/h | Subtotal |\n");
    md.push_str("|------|-------|--------|----------|\n");
    for r in rows {
        md.push_str(&format!(
            "| {} | {}h | €{} | €{} |\n",
            r.title,
            group_thousands(r.hours),
            r.hourly_rate,
            euros(r.subtotal)
        ));
    }
    md.push_str(&format!(
        "| **TOTAL** | **{}h** | | **€{}** |\n\n",
        group_thousands(total_hours),
        euros(total_cost)
    ));
    md
}

fn response_format_property() -> PropertySchema {
    PropertySchema::string("Output format: 'markdown' for readable or 'json' for structured")
        .with_default(json!("markdown"))
        .with_enum(&["markdown", "json"])
}

fn discount_tier_property() -> PropertySchema {
    PropertySchema::string("Discount tier: 'standard' (0%), 'long_term', or 'strategic'")
        .with_default(json!("standard"))
        .with_enum(&["standard", "long_term", "strategic"])
}

// ── estimate_project ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EstimateProjectParams {
    project_description: String,
    #[serde(default)]
    duration_weeks: Option<u32>,
    #[serde(default)]
    complexity: Complexity,
    #[serde(default)]
    discount_tier: DiscountTier,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl EstimateProjectParams {
    fn validate(&mut self) -> Result<(), String> {
        self.project_description = self.project_description.trim().to_string();
        if self.project_description.chars().count() < 10 {
            return Err("project_description must be at least 10 characters".to_string());
        }
        if let Some(weeks) = self.duration_weeks {
            if !(2..=104).contains(&weeks) {
                return Err("duration_weeks must be between 2 and 104".to_string());
            }
        }
        Ok(())
    }
}

pub struct EstimateProjectTool;

#[async_trait]
impl Tool for EstimateProjectTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "project_description".to_string(),
            PropertySchema::string("Description of the project scope and requirements"),
        );
        properties.insert(
            "duration_weeks".to_string(),
            PropertySchema::integer(
                "Estimated duration in weeks (2-104). Estimated automatically if omitted.",
            ),
        );
        properties.insert(
            "complexity".to_string(),
            PropertySchema::string("Project complexity level")
                .with_default(json!("medium"))
                .with_enum(&["low", "medium", "high", "very_high"]),
        );
        properties.insert("discount_tier".to_string(), discount_tier_property());
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "estimate_project".to_string(),
            description: "Generate a full project cost estimation: AI scope analysis recommends \
                          the team, then rate card pricing with complexity multiplier, phase \
                          distribution, and discount is applied."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["project_description"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let mut params: EstimateProjectParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if let Err(e) = params.validate() {
            return ToolResult::error(e);
        }

        let rate_card = match load_rate_card(&context.data_dir) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(e),
        };
        let multiplier = rate_card.multiplier(params.complexity);
        let discount_pct = rate_card.discount_pct(params.discount_tier);

        let analysis = analyze_scope(context, &params.project_description).await;
        let weeks = params.duration_weeks.unwrap_or(analysis.estimated_weeks);

        let mut role_estimates = Vec::new();
        let mut total_hours: i64 = 0;
        let mut total_cost: f64 = 0.0;

        for entry in &analysis.roles {
            let adjusted_hours = (entry.hours as f64 * multiplier).ceil() as i64;
            let (rate, title) = match rate_card.role(&entry.role_id) {
                Some(info) => (info.hourly_rate, info.title.clone()),
                None => (DEFAULT_HOURLY_RATE, titleize(&entry.role_id)),
            };
            let subtotal = (adjusted_hours * rate) as f64;
            total_hours += adjusted_hours;
            total_cost += subtotal;
            role_estimates.push(RoleEstimate {
                role_id: entry.role_id.clone(),
                title,
                hours: adjusted_hours,
                hourly_rate: rate,
                subtotal,
            });
        }

        let phase_estimates: Vec<PhaseEstimate> = rate_card
            .phase_distribution
            .iter()
            .map(|phase| PhaseEstimate {
                phase: titleize(&phase.phase),
                description: phase.description.clone(),
                pct_of_total: phase.pct_of_total,
                hours: (total_hours as f64 * phase.pct_of_total as f64 / 100.0).ceil() as i64,
                cost: round2(total_cost * phase.pct_of_total as f64 / 100.0),
            })
            .collect();

        let discount_amount = total_cost * discount_pct as f64 / 100.0;
        let cost_after_discount = round2(total_cost - discount_amount);

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(&json!({
                "total_hours": total_hours,
                "total_cost": round2(total_cost),
                "cost_after_discount": cost_after_discount,
                "discount_pct": discount_pct,
                "complexity": params.complexity.to_string(),
                "duration_weeks": weeks,
                "roles": role_estimates,
                "phases": phase_estimates,
                "currency": rate_card.currency,
                "assumptions": analysis.assumptions,
                "risks": analysis.risks,
            })));
        }

        let mut md = "# 💰 Project Cost Estimation\n\n".to_string();
        md.push_str(&format!(
            "**Complexity:** {} (×{})\n",
            titleize(&params.complexity.to_string()),
            multiplier
        ));
        md.push_str(&format!("**Duration:** {} weeks\n", weeks));
        md.push_str(&format!(
            "**Total Hours:** {}h\n\n",
            group_thousands(total_hours)
        ));

        md.push_str("## Team & Cost Breakdown\n\n");
        md.push_str(&role_table(&role_estimates, total_hours, total_cost));

        if discount_pct > 0 {
            md.push_str(&format!(
                "**Discount ({}):** -{}% → **€{}**\n\n",
                params.discount_tier,
                discount_pct,
                euros(cost_after_discount)
            ));
        }

        md.push_str("## Phase Distribution\n\n");
        md.push_str("| Phase | % | Hours | Cost |\n");
        md.push_str("|-------|---|-------|------|\n");
        for p in &phase_estimates {
            md.push_str(&format!(
                "| {} | {}% | {}h | €{} |\n",
                p.phase,
                p.pct_of_total,
                group_thousands(p.hours),
                euros(p.cost)
            ));
        }

        if !analysis.assumptions.is_empty() {
            md.push_str("\n## 📌 Assumptions\n");
            for a in &analysis.assumptions {
                md.push_str(&format!("- {}\n", a));
            }
        }
        if !analysis.risks.is_empty() {
            md.push_str("\n## ⚠️ Cost Risks\n");
            for r in &analysis.risks {
                md.push_str(&format!("- {}\n", r));
            }
        }

        ToolResult::success(md)
    }
}

// ── estimate_from_roles ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RoleEntry {
    #[serde(default = "default_role_id")]
    role_id: String,
    #[serde(default)]
    hours: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    hourly_rate: Option<i64>,
}

fn default_role_id() -> String {
    "custom".to_string()
}

#[derive(Debug, Deserialize)]
struct EstimateFromRolesParams {
    roles: Vec<RoleEntry>,
    #[serde(default)]
    discount_tier: DiscountTier,
    #[serde(default)]
    response_format: ResponseFormat,
}

pub struct EstimateFromRolesTool;

#[async_trait]
impl Tool for EstimateFromRolesTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "roles".to_string(),
            PropertySchema::string_array(
                "Team composition as JSON objects. Each entry: \
                 {\"role_id\": \"backend_dev\", \"hours\": 200} or \
                 {\"role_id\": \"custom\", \"title\": \"Data Scientist\", \
                 \"hourly_rate\": 90, \"hours\": 100}",
            ),
        );
        properties.insert("discount_tier".to_string(), discount_tier_property());
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "estimate_from_roles".to_string(),
            description: "Calculate project cost from a manually defined team composition \
                          using rate card prices."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &["roles"]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: EstimateFromRolesParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if params.roles.is_empty() {
            return ToolResult::error("roles must contain at least one entry".to_string());
        }

        let rate_card = match load_rate_card(&context.data_dir) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(e),
        };
        let discount_pct = rate_card.discount_pct(params.discount_tier);

        let mut role_estimates = Vec::new();
        let mut total_hours: i64 = 0;
        let mut total_cost: f64 = 0.0;

        for entry in &params.roles {
            let (title, rate) = if entry.role_id == "custom" {
                (
                    entry.title.clone().unwrap_or_else(|| "Custom Role".to_string()),
                    entry.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
                )
            } else {
                match rate_card.role(&entry.role_id) {
                    Some(info) => (info.title.clone(), info.hourly_rate),
                    None => (titleize(&entry.role_id), DEFAULT_HOURLY_RATE),
                }
            };
            let subtotal = (entry.hours * rate) as f64;
            total_hours += entry.hours;
            total_cost += subtotal;
            role_estimates.push(RoleEstimate {
                role_id: entry.role_id.clone(),
                title,
                hours: entry.hours,
                hourly_rate: rate,
                subtotal,
            });
        }

        let discount_amount = total_cost * discount_pct as f64 / 100.0;
        let cost_after_discount = round2(total_cost - discount_amount);

        if params.response_format == ResponseFormat::Json {
            return ToolResult::success(format_json_response(&json!({
                "total_hours": total_hours,
                "total_cost": round2(total_cost),
                "cost_after_discount": cost_after_discount,
                "discount_pct": discount_pct,
                "roles": role_estimates,
                "currency": rate_card.currency,
            })));
        }

        let mut md = "# 💰 Custom Team Estimation\n\n".to_string();
        md.push_str(&role_table(&role_estimates, total_hours, total_cost));
        if discount_pct > 0 {
            md.push_str(&format!(
                "**Discount ({}):** -{}% → **€{}**\n",
                params.discount_tier,
                discount_pct,
                euros(cost_after_discount)
            ));
        }

        ToolResult::success(md)
    }
}

// ── get_rate_card ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GetRateCardParams {
    #[serde(default)]
    response_format: ResponseFormat,
}

pub struct GetRateCardTool;

#[async_trait]
impl Tool for GetRateCardTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert("response_format".to_string(), response_format_property());

        ToolDefinition {
            name: "get_rate_card".to_string(),
            description: "Return the current rate card with all roles, hourly rates, \
                          complexity multipliers, and discount tiers."
                .to_string(),
            input_schema: ToolInputSchema::object(properties, &[]),
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: GetRateCardParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.response_format == ResponseFormat::Json {
            // Passed through verbatim so stored values keep their shape.
            let path = rate_card_path(&context.data_dir);
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    return ToolResult::error(format!("Failed to read {}: {}", path.display(), e))
                }
            };
            return match serde_json::from_str::<Value>(&content) {
                Ok(v) => ToolResult::success(format_json_response(&v)),
                Err(e) => ToolResult::error(format!("Failed to parse {}: {}", path.display(), e)),
            };
        }

        let rate_card = match load_rate_card(&context.data_dir) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(e),
        };

        let mut md = "# 📊 Current Rate Card\n\n".to_string();
        md.push_str(&format!("**Currency:** {}\n\n", rate_card.currency));

        md.push_str("## Roles & Rates\n\n");
        md.push_str("| Role | Rate/h | Typical Allocation | Description |\n");
        md.push_str("|------|--------|--------------------|-------------|\n");
        for r in &rate_card.roles {
            md.push_str(&format!(
                "| {} | €{} | {}% | {} |\n",
                r.title, r.hourly_rate, r.typical_allocation_pct, r.description
            ));
        }

        md.push_str("\n## Complexity Multipliers\n\n");
        md.push_str("| Level | Multiplier |\n");
        md.push_str("|-------|------------|\n");
        for level in Complexity::iter() {
            md.push_str(&format!(
                "| {} | ×{} |\n",
                titleize(&level.to_string()),
                rate_card.multiplier(level)
            ));
        }

        md.push_str("\n## Discount Tiers\n\n");
        md.push_str("| Tier | Discount |\n");
        md.push_str("|------|----------|\n");
        for tier in DiscountTier::iter() {
            md.push_str(&format!(
                "| {} | {}% |\n",
                titleize(&tier.to_string()),
                rate_card.discount_pct(tier)
            ));
        }

        ToolResult::success(md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::test_support::{test_context, StubGenerator, StubSearch};
    use std::io::Write;
    use std::sync::Arc;

    const CARD: &str = r#"{
        "currency": "EUR",
        "roles": [
            {"role_id": "pm", "title": "Project Manager", "hourly_rate": 85,
             "typical_allocation_pct": 10, "description": "Planning and coordination"},
            {"role_id": "backend_dev", "title": "Backend Developer", "hourly_rate": 75,
             "typical_allocation_pct": 30, "description": "APIs and services"},
            {"role_id": "qa", "title": "QA Engineer", "hourly_rate": 60,
             "typical_allocation_pct": 15, "description": "Testing and quality"}
        ],
        "complexity_multipliers": {"low": 0.85, "medium": 1.0, "high": 1.25, "very_high": 1.5},
        "discount_tiers": {"standard": 0, "long_term": 5, "strategic": 10},
        "phase_distribution": [
            {"phase": "discovery", "description": "Requirements and design", "pct_of_total": 15},
            {"phase": "development", "description": "Implementation", "pct_of_total": 60},
            {"phase": "testing", "description": "QA and hardening", "pct_of_total": 15},
            {"phase": "deployment", "description": "Launch and handover", "pct_of_total": 10}
        ]
    }"#;

    fn card_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("rate_card.json")).unwrap();
        file.write_all(CARD.as_bytes()).unwrap();
        dir
    }

    fn context_with(dir: &tempfile::TempDir, generator_response: &str) -> ToolContext {
        test_context(
            Arc::new(StubGenerator::new(generator_response)),
            Arc::new(StubSearch::empty()),
            dir.path(),
        )
    }

    #[tokio::test]
    async fn test_estimate_from_roles_arithmetic() {
        let dir = card_dir();
        let result = EstimateFromRolesTool
            .execute(
                json!({
                    "roles": [
                        {"role_id": "backend_dev", "hours": 200},
                        {"role_id": "custom", "title": "Data Scientist",
                         "hourly_rate": 90, "hours": 100}
                    ],
                    "discount_tier": "long_term",
                    "response_format": "json"
                }),
                &context_with(&dir, ""),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["total_hours"], 300);
        // 200*75 + 100*90 = 24000; 5% discount = 22800
        assert_eq!(v["total_cost"], 24000.0);
        assert_eq!(v["cost_after_discount"], 22800.0);
        assert_eq!(v["roles"][1]["title"], "Data Scientist");
        assert_eq!(v["currency"], "EUR");
    }

    #[tokio::test]
    async fn test_unknown_role_gets_default_rate_and_title() {
        let dir = card_dir();
        let result = EstimateFromRolesTool
            .execute(
                json!({"roles": [{"role_id": "ml_engineer", "hours": 10}],
                       "response_format": "json"}),
                &context_with(&dir, ""),
            )
            .await;

        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["roles"][0]["title"], "Ml Engineer");
        assert_eq!(v["roles"][0]["hourly_rate"], 80);
        assert_eq!(v["total_cost"], 800.0);
    }

    #[tokio::test]
    async fn test_estimate_project_applies_complexity_ceiling() {
        let dir = card_dir();
        let analysis = json!({
            "estimated_weeks": 8,
            "roles": [{"role_id": "backend_dev", "hours": 101, "justification": "Core"}],
            "assumptions": ["API-first build"],
            "risks": []
        })
        .to_string();
        let result = EstimateProjectTool
            .execute(
                json!({"project_description": "Build a booking platform for clinics",
                       "complexity": "high", "response_format": "json"}),
                &context_with(&dir, &analysis),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        // ceil(101 * 1.25) = 127 hours at 75/h
        assert_eq!(v["total_hours"], 127);
        assert_eq!(v["total_cost"], 9525.0);
        assert_eq!(v["duration_weeks"], 8);
        assert_eq!(v["phases"].as_array().unwrap().len(), 4);
        // ceil(127 * 15 / 100) = 20
        assert_eq!(v["phases"][0]["hours"], 20);
    }

    #[tokio::test]
    async fn test_unparseable_analysis_falls_back_to_default_team() {
        let dir = card_dir();
        let result = EstimateProjectTool
            .execute(
                json!({"project_description": "Some data platform with dashboards",
                       "response_format": "json"}),
                &context_with(&dir, "sorry, no JSON here"),
            )
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["duration_weeks"], 12);
        assert_eq!(v["roles"].as_array().unwrap().len(), 6);
        assert_eq!(v["assumptions"][0], "Fallback estimate, scope analysis unavailable");
    }

    #[tokio::test]
    async fn test_short_description_rejected_before_analysis() {
        let dir = card_dir();
        let generator = Arc::new(StubGenerator::new("{}"));
        let context = test_context(generator.clone(), Arc::new(StubSearch::empty()), dir.path());
        let result = EstimateProjectTool
            .execute(json!({"project_description": "too short"}), &context)
            .await;

        assert!(!result.success);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rate_card_json_is_passed_through_verbatim() {
        let dir = card_dir();
        let result = GetRateCardTool
            .execute(json!({"response_format": "json"}), &context_with(&dir, ""))
            .await;

        assert!(result.success);
        let v: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(v["roles"][1]["hourly_rate"], 75);
        assert_eq!(v["complexity_multipliers"]["very_high"], 1.5);
    }

    #[tokio::test]
    async fn test_rate_card_markdown_lists_all_roles_and_tiers() {
        let dir = card_dir();
        let result = GetRateCardTool
            .execute(json!({}), &context_with(&dir, ""))
            .await;

        assert!(result.success);
        assert!(result.content.contains("| Backend Developer | €75 | 30% |"));
        assert!(result.content.contains("| Very High | ×1.5 |"));
        assert!(result.content.contains("| Strategic | 10% |"));
    }

    #[tokio::test]
    async fn test_missing_rate_card_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = GetRateCardTool
            .execute(json!({}), &context_with(&dir, ""))
            .await;
        assert!(!result.success);
    }
}
