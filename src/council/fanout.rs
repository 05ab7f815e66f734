//! Concurrent per-model calls with individual deadlines

use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{GenerateRequest, GenerationConfig, LlmError, LlmProvider};
use crate::models::ModelResponse;

use super::catalog::QueryTimeouts;
use super::tracker::{ModelUpdate, RequestTracker, Status};

/// Output budget for each research model
pub const QUERY_MAX_TOKENS: u32 = 4000;

/// What one model produced. Failures are carried, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswer {
    pub model: String,
    /// Empty when the call failed
    pub response: String,
    pub tokens: u32,
    pub error: Option<String>,
    /// One of `Completed`, `Error`, `Timeout`
    pub outcome: Status,
    pub elapsed: Duration,
}

impl ModelAnswer {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Frontend view: failed models show their error in place of an answer
    pub fn to_model_response(&self) -> ModelResponse {
        let response = match &self.error {
            Some(error) => format!("Error: {}", error),
            None => self.response.clone(),
        };
        ModelResponse {
            model: self.model.clone(),
            response,
            tokens: self.tokens,
        }
    }

    fn failed(model: &str, outcome: Status, error: String, elapsed: Duration) -> Self {
        Self {
            model: model.to_string(),
            response: String::new(),
            tokens: 0,
            error: Some(error),
            outcome,
            elapsed,
        }
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("Request timed out after {:?} seconds", timeout.as_secs_f64())
}

/// Ask a single model, giving up after `timeout`
pub async fn query_model(
    provider: &dyn LlmProvider,
    model: &str,
    prompt: &str,
    timeout: Duration,
) -> ModelAnswer {
    let started = Instant::now();
    let request =
        GenerateRequest::single_turn(model, prompt, GenerationConfig::new(QUERY_MAX_TOKENS));

    match tokio::time::timeout(timeout, provider.generate(request)).await {
        Ok(Ok(response)) => ModelAnswer {
            model: model.to_string(),
            tokens: response.answer_tokens(QUERY_MAX_TOKENS),
            response: response.content,
            error: None,
            outcome: Status::Completed,
            elapsed: started.elapsed(),
        },
        Ok(Err(LlmError::Timeout(_))) | Err(_) => {
            ModelAnswer::failed(model, Status::Timeout, timeout_message(timeout), started.elapsed())
        }
        Ok(Err(err)) => {
            warn!(model, kind = err.kind(), error = %err, "Model query failed");
            ModelAnswer::failed(model, Status::Error, err.to_string(), started.elapsed())
        }
    }
}

/// Query every model concurrently, reporting progress to `tracker`.
///
/// Answers come back in the order of `models`.
pub async fn fan_out(
    provider: &dyn LlmProvider,
    models: &[String],
    prompt: &str,
    timeouts: QueryTimeouts,
    tracker: &RequestTracker,
    request_id: Uuid,
) -> Vec<ModelAnswer> {
    let calls = models.iter().map(|model| async move {
        tracker
            .set_model(request_id, model, Status::Querying, ModelUpdate::default())
            .await;

        let answer = query_model(provider, model, prompt, timeouts.for_model(model)).await;
        info!(
            %request_id,
            model = %answer.model,
            outcome = ?answer.outcome,
            tokens = answer.tokens,
            elapsed_ms = answer.elapsed.as_millis() as u64,
            "Model answered"
        );

        tracker
            .set_model(
                request_id,
                model,
                answer.outcome,
                ModelUpdate {
                    tokens: Some(answer.tokens),
                    error: answer.error.clone(),
                    elapsed: Some(answer.elapsed),
                },
            )
            .await;
        answer
    });

    join_all(calls).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FinishReason, GenerateResponse, UsageMetadata};
    use async_trait::async_trait;

    /// Answers instantly unless the model name says otherwise
    struct ScriptedProvider;

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
            assert_eq!(request.config.max_tokens, QUERY_MAX_TOKENS);
            match request.model.as_str() {
                m if m.contains("slow") => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    unreachable!("query should have timed out")
                }
                m if m.contains("broken") => Err(LlmError::HttpError {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
                m if m.contains("gatewaytimeout") => Err(LlmError::Timeout(Duration::from_secs(300))),
                _ => Ok(GenerateResponse {
                    content: format!("answer from {}", request.model),
                    usage: Some(UsageMetadata::new(40, 60)),
                    finish_reason: FinishReason::Stop,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_query_model_success() {
        let answer = query_model(&ScriptedProvider, "openai/gpt-4o:online", "q", Duration::from_secs(1)).await;
        assert!(answer.is_success());
        assert_eq!(answer.outcome, Status::Completed);
        assert_eq!(answer.response, "answer from openai/gpt-4o:online");
        assert_eq!(answer.tokens, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_model_timeout() {
        let answer = query_model(&ScriptedProvider, "slow/model", "q", Duration::from_secs(2)).await;
        assert_eq!(answer.outcome, Status::Timeout);
        assert_eq!(answer.error.as_deref(), Some("Request timed out after 2.0 seconds"));
        assert_eq!(answer.tokens, 0);
        assert!(answer.response.is_empty());
    }

    #[test]
    fn test_timeout_message_prints_fractional_seconds() {
        assert_eq!(timeout_message(Duration::from_secs(120)), "Request timed out after 120.0 seconds");
        assert_eq!(timeout_message(Duration::from_millis(200)), "Request timed out after 0.2 seconds");
    }

    #[tokio::test]
    async fn test_transport_timeout_reports_query_deadline() {
        let answer =
            query_model(&ScriptedProvider, "gatewaytimeout/model", "q", Duration::from_secs(60)).await;
        assert_eq!(answer.outcome, Status::Timeout);
        assert_eq!(answer.error.as_deref(), Some("Request timed out after 60.0 seconds"));
    }

    #[tokio::test]
    async fn test_query_model_error() {
        let answer = query_model(&ScriptedProvider, "broken/model", "q", Duration::from_secs(1)).await;
        assert_eq!(answer.outcome, Status::Error);
        assert!(answer.error.as_deref().unwrap().contains("502"));
        assert_eq!(
            answer.to_model_response().response,
            "Error: HTTP error (status 502): bad gateway"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_keeps_order_and_tracks_progress() {
        let tracker = RequestTracker::new();
        let id = Uuid::new_v4();
        let models = vec![
            "slow/model".to_string(),
            "openai/gpt-4o:online".to_string(),
            "broken/model".to_string(),
        ];
        tracker.register(id, &models, "anthropic/claude-sonnet-4.5").await;

        let timeouts = QueryTimeouts {
            default: Duration::from_secs(5),
            slow: Duration::from_secs(10),
        };
        let answers = fan_out(&ScriptedProvider, &models, "q", timeouts, &tracker, id).await;

        let names: Vec<&str> = answers.iter().map(|a| a.model.as_str()).collect();
        assert_eq!(names, vec!["slow/model", "openai/gpt-4o:online", "broken/model"]);

        let status = tracker.status(id).await.unwrap();
        let states: Vec<Status> = status.models.iter().map(|m| m.status).collect();
        assert_eq!(states, vec![Status::Timeout, Status::Completed, Status::Error]);
        assert_eq!(status.models[1].tokens, Some(60));
    }
}
