pub mod claude;
pub mod retry;
pub mod search;
pub mod types;

pub use claude::ClaudeClient;
pub use retry::{LinearBackoff, RetryPolicy};
pub use search::{SearchBackend, SearchOutcome, SearchResult, TavilyClient};
pub use types::{
    AiError, AiResponse, ClaudeContentBlock, ClaudeMessage, ClaudeMessageContent, ClaudeTool,
    ToolCall,
};

use async_trait::async_trait;

/// Single-shot text generation seam used by agent tools.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, AiError>;
}

/// Tool-use reasoning seam used by the orchestrator loop.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn reason(
        &self,
        model: &str,
        system: &str,
        messages: &[ClaudeMessage],
        tools: &[ClaudeTool],
        max_tokens: u32,
    ) -> Result<AiResponse, AiError>;
}
