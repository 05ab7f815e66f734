//! Mapping between abstraction types and OpenRouter wire types

use crate::llm::core::{
    error::LlmError,
    types::{FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole, UsageMetadata},
};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatUsage};

/// Convert our abstraction request to the chat-completions format
pub fn to_chat_request(request: GenerateRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model,
        messages: request.messages.into_iter().map(to_chat_message).collect(),
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
    }
}

fn to_chat_message(message: Message) -> ChatMessage {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };
    ChatMessage {
        role: role.to_string(),
        content: message.content,
    }
}

/// Convert a successful HTTP body into our response, surfacing inline errors
pub fn from_chat_response(response: ChatCompletionResponse) -> Result<GenerateResponse, LlmError> {
    if let Some(error) = response.error {
        return Err(LlmError::ProviderError {
            code: error.code_string(),
            message: error.message.unwrap_or_default(),
        });
    }

    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| LlmError::ProviderError {
            code: "no_choices".to_string(),
            message: "No choices in response".to_string(),
        })?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();

    Ok(GenerateResponse {
        content,
        usage: response.usage.map(from_chat_usage),
        finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
    })
}

fn from_chat_usage(usage: ChatUsage) -> UsageMetadata {
    let input_tokens = usage.prompt_tokens.unwrap_or(0);
    let output_tokens = usage.completion_tokens.unwrap_or(0);
    UsageMetadata {
        input_tokens,
        output_tokens,
        total_tokens: usage.total_tokens.unwrap_or(input_tokens + output_tokens),
    }
}
