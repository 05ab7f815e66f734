// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::council::catalog::DEFAULT_AGGREGATOR;

fn default_aggregator() -> String {
    DEFAULT_AGGREGATOR.to_string()
}

// Request Types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub models: Vec<String>,
    #[serde(default = "default_aggregator")]
    pub aggregator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
}

// One model's answer as shown to the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
    pub response: String,
    pub tokens: u32,
}

// Final result of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub aggregated: String,
    pub individual: Vec<ModelResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResponse {
    pub request_id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub optimized: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<&'static str>,
    pub aggregators: Vec<&'static str>,
    pub default_aggregator: &'static str,
}

// Error body, `{"detail": "..."}` like the original frontend expects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
