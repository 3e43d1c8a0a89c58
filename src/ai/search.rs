//! Tavily web search client.

use crate::ai::types::{map_status_message, AiError};
use crate::http::shared_client;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const TAVILY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Search results plus Tavily's optional synthesized answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.answer.as_deref().unwrap_or("").is_empty()
    }
}

/// Web search seam so agent tools can run against a stub in tests.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, max_results: u8) -> Result<SearchOutcome, AiError>;
}

pub struct TavilyClient {
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(api_key: &str, endpoint: Option<&str>) -> Self {
        TavilyClient {
            api_key: api_key.to_string(),
            endpoint: endpoint.unwrap_or(TAVILY_API_URL).to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for TavilyClient {
    async fn search(&self, query: &str, max_results: u8) -> Result<SearchOutcome, AiError> {
        let response = shared_client()
            .post(&self.endpoint)
            .timeout(TAVILY_TIMEOUT)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": max_results,
                "include_answer": true,
                "include_raw_content": false,
                "search_depth": "advanced",
            }))
            .send()
            .await
            .map_err(|e| AiError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("[tavily] API error {} for query '{}'", status, query);
            return Err(AiError::with_status(
                map_status_message(status.as_u16()),
                status.as_u16(),
            ));
        }

        response
            .json::<SearchOutcome>()
            .await
            .map_err(|e| AiError::new(format!("Failed to decode search response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_emptiness() {
        let outcome = SearchOutcome::default();
        assert!(outcome.is_empty());

        let outcome = SearchOutcome {
            results: vec![],
            answer: Some("".to_string()),
        };
        assert!(outcome.is_empty());

        let outcome = SearchOutcome {
            results: vec![],
            answer: Some("Acme builds rockets".to_string()),
        };
        assert!(!outcome.is_empty());
    }

    #[test]
    fn test_outcome_deserialization() {
        let outcome: SearchOutcome = serde_json::from_str(
            r#"{"results": [{"title": "Acme", "url": "https://acme.test", "content": "info"}],
                "answer": "summary"}"#,
        )
        .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].title, "Acme");
        assert_eq!(outcome.answer.as_deref(), Some("summary"));
    }
}
