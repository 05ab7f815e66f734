//! Provider trait for LLM implementations

use async_trait::async_trait;

use super::{
    error::LlmError,
    types::{GenerateRequest, GenerateResponse},
};

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete (non-streamed) answer
    ///
    /// The request names the model to use, so one provider can serve every
    /// model behind a gateway.
    ///
    /// # Arguments
    /// * `request` - The generation request with model, messages, and config
    ///
    /// # Returns
    /// The full answer text with usage metadata, or an error if the call fails
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}
