//! Anthropic Messages API client.
//!
//! Used two ways: `generate_text` for single-shot analysis/generation inside
//! agent tools, and `generate_with_tools` for the orchestrator's agentic
//! loop. Rate limits are retried through the injected policy; every other
//! failure maps once to a fixed advisory message.

use crate::ai::retry::{with_retry, RetryPolicy};
use crate::ai::types::{
    map_status_message, AiError, AiResponse, ClaudeMessage, ClaudeTool, ToolCall,
};
use crate::ai::{ReasoningBackend, TextGenerator};
use crate::http::shared_client;
use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeClient {
    auth_headers: header::HeaderMap,
    endpoint: String,
    retry: Arc<dyn RetryPolicy>,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ClaudeMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ClaudeTool]>,
}

impl ClaudeClient {
    pub fn new(
        api_key: &str,
        endpoint: Option<&str>,
        retry: Arc<dyn RetryPolicy>,
    ) -> Result<Self, AiError> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(api_key)
                .map_err(|_| AiError::new("Invalid API key format"))?,
        );
        auth_headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(ClaudeClient {
            auth_headers,
            endpoint: endpoint.unwrap_or(DEFAULT_ENDPOINT).to_string(),
            retry,
        })
    }

    /// One request/response cycle with tool support.
    pub async fn generate_with_tools(
        &self,
        model: &str,
        system: &str,
        messages: &[ClaudeMessage],
        tools: &[ClaudeTool],
        max_tokens: u32,
    ) -> Result<AiResponse, AiError> {
        let body = self
            .send(ClaudeRequest {
                model,
                max_tokens,
                system,
                messages,
                tools: Some(tools),
            })
            .await?;
        Ok(Self::parse_response(&body))
    }

    /// Plain text generation from a system prompt and one user message.
    pub async fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let messages = vec![ClaudeMessage::user(prompt)];
        let body = self
            .send(ClaudeRequest {
                model,
                max_tokens,
                system,
                messages: &messages,
                tools: None,
            })
            .await?;
        Ok(Self::parse_response(&body).content)
    }

    async fn send(&self, request: ClaudeRequest<'_>) -> Result<Value, AiError> {
        let payload = serde_json::to_value(&request)
            .map_err(|e| AiError::new(format!("Failed to encode request: {}", e)))?;

        with_retry(self.retry.as_ref(), || {
            let payload = payload.clone();
            async move {
                let response = shared_client()
                    .post(&self.endpoint)
                    .headers(self.auth_headers.clone())
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| AiError::from_transport(&e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    log::error!("[claude] API error {}: {}", status, body);
                    return Err(AiError::with_status(
                        map_status_message(status.as_u16()),
                        status.as_u16(),
                    ));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|e| AiError::new(format!("Failed to decode response: {}", e)))
            }
        })
        .await
    }

    /// Extract accumulated text and tool calls from a raw API response.
    ///
    /// Unknown block types (thinking etc.) are skipped rather than rejected.
    fn parse_response(body: &Value) -> AiResponse {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(blocks) = body.get("content").and_then(Value::as_array) {
            for block in blocks {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            content.push_str(text);
                        }
                    }
                    Some("tool_use") => {
                        tool_calls.push(ToolCall {
                            id: block
                                .get("id")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            name: block
                                .get("name")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            arguments: block.get("input").cloned().unwrap_or(Value::Null),
                        });
                    }
                    _ => {}
                }
            }
        }

        AiResponse {
            content,
            tool_calls,
            stop_reason: body
                .get("stop_reason")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn generate_text(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        self.generate(model, system, prompt, max_tokens).await
    }
}

#[async_trait]
impl ReasoningBackend for ClaudeClient {
    async fn reason(
        &self,
        model: &str,
        system: &str,
        messages: &[ClaudeMessage],
        tools: &[ClaudeTool],
        max_tokens: u32,
    ) -> Result<AiResponse, AiError> {
        self.generate_with_tools(model, system, messages, tools, max_tokens)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_text_only() {
        let body = json!({
            "content": [{"type": "text", "text": "Hello."}],
            "stop_reason": "end_turn"
        });
        let response = ClaudeClient::parse_response(&body);
        assert_eq!(response.content, "Hello.");
        assert!(response.tool_calls.is_empty());
        assert!(!response.is_tool_use());
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "pricing__get_rate_card",
                 "input": {"response_format": "json"}},
            ],
            "stop_reason": "tool_use"
        });
        let response = ClaudeClient::parse_response(&body);
        assert!(response.is_tool_use());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "pricing__get_rate_card");
        assert_eq!(response.tool_calls[0].arguments["response_format"], "json");
    }

    #[test]
    fn test_parse_response_skips_unknown_blocks() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "done"},
            ],
            "stop_reason": "end_turn"
        });
        let response = ClaudeClient::parse_response(&body);
        assert_eq!(response.content, "done");
    }
}
