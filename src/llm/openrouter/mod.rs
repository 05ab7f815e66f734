//! OpenRouter provider implementation
//!
//! One client serves every model in the catalog; the model is chosen per
//! request through `GenerateRequest::model`.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{OpenRouterClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
