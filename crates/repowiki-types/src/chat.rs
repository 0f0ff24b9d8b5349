use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// Chat message structure (OpenAI-compatible format)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into(), ..Default::default() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into(), ..Default::default() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into(), ..Default::default() }
    }
}

/// Token usage information reported by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a chat backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
}

/// Incremental chunk of a streaming response
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub delta: String,
    pub finish_reason: Option<String>,
}

/// Stream of response chunks
pub type MessageStream = Box<dyn Stream<Item = Result<StreamChunk>> + Send + Unpin>;

/// Tool definition for function calling, as bound to a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Chat backend contract - unified interface for all credentialed model backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name, used in logs and routing decisions
    fn name(&self) -> &str;

    /// Non-streaming chat completion
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse>;

    /// Streaming chat completion - returns a stream of chunks
    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<MessageStream> {
        let _ = messages;
        Err(anyhow::anyhow!("streaming not supported by backend '{}'", self.name()))
    }

    /// Bind a tool set to the backend for subsequent calls
    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Result<()>;
}

impl std::fmt::Debug for dyn ChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBackend").field("name", &self.name()).finish()
    }
}
