//! OpenRouter chat-completions request and response types
//!
//! These types map directly to the OpenAI-compatible `/chat/completions`
//! schema that OpenRouter exposes.

use serde::{Deserialize, Serialize};

/// Body of a `/chat/completions` call
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Gateway model identifier
    pub model: String,
    /// Conversation turns
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single chat message on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// Response body of `/chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
    /// OpenRouter reports some upstream failures with a 200 and this object
    #[serde(default)]
    pub error: Option<ChatApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    /// Null for some providers when the answer is empty
    #[serde(default)]
    pub content: Option<String>,
}

/// Usage block; every field is optional in practice
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Error object, either top-level in an error response or inline
#[derive(Debug, Clone, Deserialize)]
pub struct ChatApiError {
    #[serde(default)]
    pub message: Option<String>,
    /// Numeric on OpenRouter, string on some upstreams
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl ChatApiError {
    /// Code rendered as a string, "unknown" if absent
    pub fn code_string(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }
}
