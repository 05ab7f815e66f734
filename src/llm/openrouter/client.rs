//! OpenRouter client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::llm::core::{
    error::LlmError,
    provider::LlmProvider,
    types::{GenerateRequest, GenerateResponse},
};

use super::mapper::{from_chat_response, to_chat_request};
use super::types::ChatCompletionResponse;

/// Public OpenRouter API root
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Upper bound on any single HTTP exchange; callers apply tighter limits
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the OpenRouter chat-completions gateway
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    /// HTTP client carrying auth and attribution headers
    http_client: Client,
    /// API root, without trailing slash
    base_url: String,
    /// Applied to every request by reqwest
    request_timeout: Duration,
}

impl OpenRouterClient {
    /// Create a client against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, None, None)
    }

    /// Create a client with a custom endpoint and attribution headers
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or cannot be used as a header
    /// value, or if the HTTP client cannot be built.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        request_timeout: Duration,
        referer: Option<String>,
        app_title: Option<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError(
                "OpenRouter API key is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| LlmError::AuthenticationError("Invalid API key format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(value) = referer.as_deref().and_then(|r| HeaderValue::from_str(r).ok()) {
            headers.insert("HTTP-Referer", value);
        }
        if let Some(value) = app_title.as_deref().and_then(|t| HeaderValue::from_str(t).ok()) {
            headers.insert("X-Title", value);
        }

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    /// Build the endpoint URL for chat completions
    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn make_request(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let chat_request = to_chat_request(request);
        debug!(model = %chat_request.model, max_tokens = chat_request.max_tokens, "Calling OpenRouter");

        let response = self
            .http_client
            .post(self.build_endpoint_url())
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimitExceeded { retry_after });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(error_from_body(status, body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        from_chat_response(parsed)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.request_timeout)
        } else {
            err.into()
        }
    }
}

/// Prefer the gateway's own error message over the raw body
fn error_from_body(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ChatCompletionResponse>(&body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|error| error.message);

    match (status, message) {
        (StatusCode::UNAUTHORIZED, Some(message)) | (StatusCode::FORBIDDEN, Some(message)) => {
            LlmError::AuthenticationError(message)
        }
        (_, Some(message)) => LlmError::HttpError {
            status: status.as_u16(),
            body: message,
        },
        (_, None) => LlmError::HttpError {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl LlmProvider for OpenRouterClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.make_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_key() {
        let err = OpenRouterClient::new("  ").unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationError(_)));
    }

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let client = OpenRouterClient::with_options(
            "sk-test",
            "http://localhost:9999/api/v1/",
            Duration::from_secs(5),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            client.build_endpoint_url(),
            "http://localhost:9999/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_error_from_body_uses_gateway_message() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"openai/gpt-9 is not a valid model ID","code":400}}"#.to_string(),
        );
        match err {
            LlmError::HttpError { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "openai/gpt-9 is not a valid model ID");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_error_from_body_auth() {
        let err = error_from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"No auth credentials found","code":401}}"#.to_string(),
        );
        assert!(matches!(err, LlmError::AuthenticationError(_)));
    }

    #[test]
    fn test_error_from_body_raw_text() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }
}
