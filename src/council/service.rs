//! Orchestration: validate, fan out, aggregate, record

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{LlmError, LlmProvider};
use crate::models::{ChatRequest, ChatResponse, OptimizeResponse};
use crate::query_log::{OptimizationRecord, QueryLogger, QueryRecord};

use super::aggregate::{aggregate, aggregation_failure_text, DEFAULT_AGGREGATION_TIMEOUT};
use super::catalog::{is_aggregator_model, is_query_model, QueryTimeouts};
use super::fanout::{fan_out, ModelAnswer};
use super::optimize::{optimize, DEFAULT_OPTIMIZER_TIMEOUT};
use super::tracker::{RequestTracker, Status};

pub const ALL_MODELS_FAILED: &str = "All model queries failed";

/// Rejected before any upstream call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid models: {0:?}")]
    InvalidModels(Vec<String>),

    #[error("At least one model must be selected")]
    NoModels,

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Invalid aggregator: {0}")]
    InvalidAggregator(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", ALL_MODELS_FAILED)]
    AllModelsFailed,

    #[error("Optimization failed: {0}")]
    Optimization(#[source] LlmError),
}

/// Deadlines for each kind of upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub query_timeouts: QueryTimeouts,
    pub aggregation_timeout: Duration,
    pub optimizer_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            query_timeouts: QueryTimeouts::default(),
            aggregation_timeout: DEFAULT_AGGREGATION_TIMEOUT,
            optimizer_timeout: DEFAULT_OPTIMIZER_TIMEOUT,
        }
    }
}

/// Check a chat request against the allow-lists.
///
/// Unknown models are reported before an empty selection. Repeated models
/// are collapsed to their first occurrence.
pub fn validate(mut request: ChatRequest) -> Result<ChatRequest, ValidationError> {
    let invalid: Vec<String> = request
        .models
        .iter()
        .filter(|m| !is_query_model(m))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::InvalidModels(invalid));
    }
    if request.models.is_empty() {
        return Err(ValidationError::NoModels);
    }
    if request.prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    if !is_aggregator_model(&request.aggregator) {
        return Err(ValidationError::InvalidAggregator(request.aggregator));
    }

    let mut seen = Vec::with_capacity(request.models.len());
    request.models.retain(|m| {
        if seen.contains(m) {
            false
        } else {
            seen.push(m.clone());
            true
        }
    });
    Ok(request)
}

/// Entry point for everything the HTTP layer does
#[derive(Clone)]
pub struct ResearchService {
    provider: Arc<dyn LlmProvider>,
    tracker: RequestTracker,
    logger: QueryLogger,
    settings: ServiceSettings,
}

impl ResearchService {
    pub fn new(provider: Arc<dyn LlmProvider>, logger: QueryLogger, settings: ServiceSettings) -> Self {
        Self {
            provider,
            tracker: RequestTracker::new(),
            logger,
            settings,
        }
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Validate and start a query in the background, returning its identifier
    pub async fn submit(&self, request: ChatRequest) -> Result<Uuid, ValidationError> {
        let request = validate(request)?;
        let request_id = Uuid::new_v4();
        self.tracker
            .register(request_id, &request.models, &request.aggregator)
            .await;
        info!(%request_id, models = request.models.len(), aggregator = %request.aggregator, "Query submitted");

        let service = self.clone();
        tokio::spawn(async move {
            // the outcome is already in the tracker
            let _ = service.run(&service.tracker, request_id, &request).await;
        });
        Ok(request_id)
    }

    /// Run a query to completion before returning.
    ///
    /// Nobody can poll a synchronous query, so its progress goes to a tracker
    /// owned by this call and dropped with it, even if the caller goes away.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
        let request = validate(request)?;
        let request_id = Uuid::new_v4();
        let tracker = RequestTracker::new();
        tracker
            .register(request_id, &request.models, &request.aggregator)
            .await;
        info!(%request_id, models = request.models.len(), "Synchronous query started");
        self.run(&tracker, request_id, &request).await
    }

    async fn run(
        &self,
        tracker: &RequestTracker,
        request_id: Uuid,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ServiceError> {
        let answers = fan_out(
            self.provider.as_ref(),
            &request.models,
            &request.prompt,
            self.settings.query_timeouts,
            tracker,
            request_id,
        )
        .await;

        if !answers.iter().any(ModelAnswer::is_success) {
            warn!(%request_id, "Every model failed, skipping aggregation");
            tracker
                .set_aggregation(request_id, Status::Error, Some(ALL_MODELS_FAILED.to_string()))
                .await;
            tracker
                .store_result(request_id, Err(ALL_MODELS_FAILED.to_string()))
                .await;
            return Err(ServiceError::AllModelsFailed);
        }

        tracker
            .set_aggregation(request_id, Status::Querying, None)
            .await;
        let aggregated = match aggregate(
            self.provider.as_ref(),
            &request.prompt,
            &answers,
            &request.aggregator,
            self.settings.aggregation_timeout,
        )
        .await
        {
            Ok(text) => {
                tracker
                    .set_aggregation(request_id, Status::Completed, None)
                    .await;
                text
            }
            Err(err) => {
                warn!(%request_id, aggregator = %request.aggregator, error = %err, "Aggregation failed");
                let status = match err {
                    LlmError::Timeout(_) => Status::Timeout,
                    _ => Status::Error,
                };
                tracker
                    .set_aggregation(request_id, status, Some(err.to_string()))
                    .await;
                aggregation_failure_text(&err)
            }
        };

        let response = ChatResponse {
            aggregated,
            individual: answers.iter().map(ModelAnswer::to_model_response).collect(),
        };
        tracker
            .store_result(request_id, Ok(response.clone()))
            .await;
        info!(%request_id, "Query complete");

        let record = QueryRecord::new(
            &request.prompt,
            &request.models,
            &request.aggregator,
            &answers,
            &response.aggregated,
        );
        self.logger.log_query(&record).await;

        Ok(response)
    }

    /// Rewrite a raw prompt for the research models
    pub async fn optimize(&self, prompt: &str) -> Result<OptimizeResponse, ServiceError> {
        if prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }

        let today = Local::now().date_naive();
        let result = optimize(
            self.provider.as_ref(),
            prompt,
            today,
            self.settings.optimizer_timeout,
        )
        .await
        .map_err(|err| {
            warn!(error = %err, "Prompt optimization failed");
            ServiceError::Optimization(err)
        })?;

        self.logger
            .log_optimization(&OptimizationRecord {
                timestamp: chrono::Utc::now(),
                original: prompt.to_string(),
                optimized: result.optimized.clone(),
                model: result.model.to_string(),
                tokens: result.tokens,
            })
            .await;

        Ok(OptimizeResponse {
            optimized: result.optimized,
        })
    }

    /// Periodically drop finished requests older than `ttl`
    pub fn spawn_eviction(&self, ttl: Duration, every: Duration) -> tokio::task::JoinHandle<()> {
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = tracker.evict_expired(ttl).await;
                if removed > 0 {
                    info!(removed, "Evicted finished requests");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(models: &[&str]) -> ChatRequest {
        ChatRequest {
            prompt: "What changed in EU AI regulation this week?".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            aggregator: "anthropic/claude-sonnet-4.5".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_allow_listed_models() {
        let validated = validate(request(&["openai/gpt-4o:online", "perplexity/sonar-pro"])).unwrap();
        assert_eq!(validated.models.len(), 2);
    }

    #[test]
    fn test_validate_reports_invalid_models() {
        let err = validate(request(&["openai/gpt-4o:online", "openai/gpt-4o", "foo/bar"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidModels(vec!["openai/gpt-4o".to_string(), "foo/bar".to_string()])
        );
        assert_eq!(err.to_string(), r#"Invalid models: ["openai/gpt-4o", "foo/bar"]"#);
    }

    #[test]
    fn test_validate_requires_a_model() {
        assert_eq!(validate(request(&[])).unwrap_err(), ValidationError::NoModels);
    }

    #[test]
    fn test_validate_rejects_blank_prompt() {
        let mut req = request(&["perplexity/sonar-pro"]);
        req.prompt = "   ".to_string();
        assert_eq!(validate(req).unwrap_err(), ValidationError::EmptyPrompt);
    }

    #[test]
    fn test_validate_rejects_unknown_aggregator() {
        let mut req = request(&["perplexity/sonar-pro"]);
        req.aggregator = "google/gemini-pro".to_string();
        assert!(matches!(
            validate(req).unwrap_err(),
            ValidationError::InvalidAggregator(_)
        ));
    }

    #[test]
    fn test_validate_collapses_duplicates() {
        let validated = validate(request(&[
            "x-ai/grok-4:online",
            "perplexity/sonar-pro",
            "x-ai/grok-4:online",
        ]))
        .unwrap();
        assert_eq!(validated.models, vec!["x-ai/grok-4:online", "perplexity/sonar-pro"]);
    }

    #[test]
    fn test_service_error_messages() {
        assert_eq!(ServiceError::AllModelsFailed.to_string(), "All model queries failed");
        let err = ServiceError::Optimization(LlmError::InvalidRequest("empty".to_string()));
        assert_eq!(err.to_string(), "Optimization failed: Invalid request: empty");
    }
}
