use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error from an AI backend call (Anthropic or Tavily).
#[derive(Debug, Clone, PartialEq)]
pub struct AiError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl AiError {
    pub fn new(message: impl Into<String>) -> Self {
        AiError {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        AiError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Map a transport-level failure to a fixed advisory message.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::new("Request timed out. Try again.")
        } else if err.is_connect() {
            AiError::new("Could not connect to the API. Check network.")
        } else {
            AiError::new(format!("Request failed: {}", err))
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.status_code == Some(429)
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "[HTTP {}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AiError {}

/// Fixed human-readable message for an upstream HTTP status.
pub fn map_status_message(status: u16) -> String {
    match status {
        401 => "Authentication failed. Check your API key.".to_string(),
        403 => "Permission denied. Check your API plan.".to_string(),
        404 => "Resource not found. Check the endpoint.".to_string(),
        429 => "Rate limit exceeded. Wait before retrying.".to_string(),
        _ => format!("API request failed with status {}", status),
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Parsed model response: accumulated text plus any requested tool calls.
#[derive(Debug, Clone)]
pub struct AiResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: Option<String>,
}

impl AiResponse {
    pub fn is_tool_use(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use")
    }
}

/// Tool definition in the Messages API wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A single content block in a Claude message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Message content: either a plain string or a list of typed blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaudeMessageContent {
    Text(String),
    Blocks(Vec<ClaudeContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: ClaudeMessageContent,
}

impl ClaudeMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ClaudeMessage {
            role: "user".to_string(),
            content: ClaudeMessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ClaudeMessage {
            role: "assistant".to_string(),
            content: ClaudeMessageContent::Text(text.into()),
        }
    }

    pub fn assistant_with_blocks(blocks: Vec<ClaudeContentBlock>) -> Self {
        ClaudeMessage {
            role: "assistant".to_string(),
            content: ClaudeMessageContent::Blocks(blocks),
        }
    }

    pub fn user_with_tool_results(blocks: Vec<ClaudeContentBlock>) -> Self {
        ClaudeMessage {
            role: "user".to_string(),
            content: ClaudeMessageContent::Blocks(blocks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ai_error_display() {
        let err = AiError::with_status("Rate limit exceeded. Wait before retrying.", 429);
        assert_eq!(
            err.to_string(),
            "[HTTP 429] Rate limit exceeded. Wait before retrying."
        );
        assert!(err.is_rate_limit());

        let err = AiError::new("Request timed out. Try again.");
        assert_eq!(err.to_string(), "Request timed out. Try again.");
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_status_messages_are_fixed() {
        assert_eq!(
            map_status_message(401),
            "Authentication failed. Check your API key."
        );
        assert_eq!(
            map_status_message(429),
            "Rate limit exceeded. Wait before retrying."
        );
        assert_eq!(map_status_message(500), "API request failed with status 500");
    }

    #[test]
    fn test_content_block_serialization() {
        let block = ClaudeContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "pricing__get_rate_card".to_string(),
            input: json!({"response_format": "json"}),
        };
        let v = serde_json::to_value(&block).unwrap();
        assert_eq!(v["type"], "tool_use");
        assert_eq!(v["name"], "pricing__get_rate_card");

        let result = ClaudeContentBlock::ToolResult {
            tool_use_id: "toolu_1".to_string(),
            content: "{}".to_string(),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["type"], "tool_result");
        assert_eq!(v["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_message_content_shapes() {
        let text = ClaudeMessage::user("hello");
        let v = serde_json::to_value(&text).unwrap();
        assert_eq!(v["content"], "hello");

        let blocks = ClaudeMessage::user_with_tool_results(vec![ClaudeContentBlock::ToolResult {
            tool_use_id: "t1".to_string(),
            content: "done".to_string(),
        }]);
        let v = serde_json::to_value(&blocks).unwrap();
        assert!(v["content"].is_array());
    }
}
