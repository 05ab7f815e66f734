//! LLM Abstraction Layer
//!
//! This module provides a small provider interface over hosted chat models
//! and its OpenRouter implementation.

pub mod core;
pub mod openrouter;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::LlmProvider,
    types::{
        FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole, UsageMetadata,
    },
};

pub use openrouter::OpenRouterClient;
