//! Core types for the LLM abstraction layer

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;

/// Request to generate content from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Gateway model identifier, e.g. `openai/gpt-4o:online`
    pub model: String,
    /// Conversation history
    pub messages: Vec<Message>,
    /// Generation parameters
    pub config: GenerationConfig,
}

impl GenerateRequest {
    /// Single user turn
    pub fn single_turn(
        model: impl Into<String>,
        prompt: impl Into<String>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            config,
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Text content
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Human input
    User,
    /// Model output
    Assistant,
}

/// A complete answer from the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Answer text of the first choice
    pub content: String,
    /// Token usage, when the gateway reports it
    pub usage: Option<UsageMetadata>,
    /// Why generation stopped
    pub finish_reason: FinishReason,
}

impl GenerateResponse {
    /// Tokens attributable to the answer itself.
    ///
    /// Gateways sometimes report inflated totals, so completion tokens win;
    /// the total is only a fallback and is capped at `max_tokens`.
    pub fn answer_tokens(&self, max_tokens: u32) -> u32 {
        match self.usage {
            Some(usage) if usage.output_tokens > 0 => usage.output_tokens,
            Some(usage) => usage.total_tokens.min(max_tokens),
            None => 0,
        }
    }

    /// Total tokens billed for the call, zero if unreported
    pub fn total_tokens(&self) -> u32 {
        self.usage.map(|u| u.total_tokens).unwrap_or(0)
    }
}

/// Reason why generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion
    Stop,
    /// Hit token limit
    MaxTokens,
    /// Blocked by safety filters
    ContentFilter,
    /// The gateway did not say
    Unknown,
    /// Provider-specific reason
    Other(String),
}

impl FinishReason {
    /// Map the wire value used by OpenAI-compatible gateways
    pub fn from_wire(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | Some("end_turn") => FinishReason::Stop,
            Some("length") | Some("max_tokens") => FinishReason::MaxTokens,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(other) => FinishReason::Other(other.to_string()),
            None => FinishReason::Unknown,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt tokens consumed
    pub input_tokens: u32,
    /// Response tokens generated
    pub output_tokens: u32,
    /// Total as reported by the gateway
    pub total_tokens: u32,
}

impl UsageMetadata {
    /// Create new usage metadata
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
