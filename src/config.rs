use std::env;
use std::path::PathBuf;

/// Pool variant selected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolMode {
    InProcess,
    Subprocess,
}

#[derive(Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub tavily_api_key: String,
    pub orchestrator_model: String,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub max_iterations: usize,
    pub pool_mode: PoolMode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Returns the full list of missing required variables on failure so
    /// the caller can report them all at once instead of one per restart.
    pub fn from_env() -> Result<Self, Vec<String>> {
        let mut missing = Vec::new();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        if anthropic_api_key.is_empty() {
            missing.push("ANTHROPIC_API_KEY".to_string());
        }

        let tavily_api_key = env::var("TAVILY_API_KEY").unwrap_or_default();
        if tavily_api_key.is_empty() {
            missing.push("TAVILY_API_KEY".to_string());
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            anthropic_api_key,
            tavily_api_key,
            orchestrator_model: env::var("ORCHESTRATOR_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            export_dir: env::var("EXPORT_DIR")
                .unwrap_or_else(|_| "exports".to_string())
                .into(),
            max_iterations: env::var("MAX_ORCHESTRATOR_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            pool_mode: match env::var("POOL_MODE").as_deref() {
                Ok("subprocess") => PoolMode::Subprocess,
                _ => PoolMode::InProcess,
            },
        })
    }
}
