//! Process-local status and result maps
//!
//! Every submitted query is registered here under its request identifier.
//! The background pipeline writes progress into the status map as each model
//! answers, and the final answer (or failure) into the result map; HTTP
//! handlers only read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::ChatResponse;

/// Lifecycle of a single upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Querying,
    Completed,
    Error,
    Timeout,
}

/// Progress of one fan-out model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// Progress of the synthesis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationStatus {
    pub model: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot returned to pollers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// In the order the models were requested
    pub models: Vec<ModelStatus>,
    pub aggregation: AggregationStatus,
    /// True once a result (or failure) is available
    pub done: bool,
}

/// Update applied to one model's entry
#[derive(Debug, Clone, Default)]
pub struct ModelUpdate {
    pub tokens: Option<u32>,
    pub error: Option<String>,
    pub elapsed: Option<Duration>,
}

/// Outcome of looking up a request's result
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLookup {
    Ready(ChatResponse),
    Failed(String),
    Pending,
    Unknown,
}

#[derive(Debug)]
struct StoredResult {
    outcome: Result<ChatResponse, String>,
    finished_at: Instant,
}

#[derive(Debug, Default)]
struct Maps {
    statuses: RwLock<HashMap<Uuid, RequestStatus>>,
    results: RwLock<HashMap<Uuid, StoredResult>>,
}

/// Shared handle to the status and result maps
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    maps: Arc<Maps>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request with every model and the aggregation pending
    pub async fn register(&self, request_id: Uuid, models: &[String], aggregator: &str) {
        let now = Utc::now();
        let status = RequestStatus {
            request_id,
            created_at: now,
            updated_at: now,
            models: models
                .iter()
                .map(|model| ModelStatus {
                    model: model.clone(),
                    status: Status::Pending,
                    tokens: None,
                    error: None,
                    elapsed_ms: None,
                })
                .collect(),
            aggregation: AggregationStatus {
                model: aggregator.to_string(),
                status: Status::Pending,
                error: None,
            },
            done: false,
        };
        self.maps.statuses.write().await.insert(request_id, status);
    }

    /// Move one model to `status`; unknown requests or models are ignored
    pub async fn set_model(&self, request_id: Uuid, model: &str, status: Status, update: ModelUpdate) {
        let mut statuses = self.maps.statuses.write().await;
        let Some(entry) = statuses.get_mut(&request_id) else {
            return;
        };
        if let Some(model_status) = entry.models.iter_mut().find(|m| m.model == model) {
            model_status.status = status;
            model_status.tokens = update.tokens.or(model_status.tokens);
            model_status.error = update.error;
            if let Some(elapsed) = update.elapsed {
                model_status.elapsed_ms = Some(elapsed.as_millis() as u64);
            }
            entry.updated_at = Utc::now();
        }
    }

    pub async fn set_aggregation(&self, request_id: Uuid, status: Status, error: Option<String>) {
        let mut statuses = self.maps.statuses.write().await;
        if let Some(entry) = statuses.get_mut(&request_id) {
            entry.aggregation.status = status;
            entry.aggregation.error = error;
            entry.updated_at = Utc::now();
        }
    }

    pub async fn status(&self, request_id: Uuid) -> Option<RequestStatus> {
        self.maps.statuses.read().await.get(&request_id).cloned()
    }

    /// Store the final outcome and mark the request done
    pub async fn store_result(&self, request_id: Uuid, outcome: Result<ChatResponse, String>) {
        self.maps.results.write().await.insert(
            request_id,
            StoredResult {
                outcome,
                finished_at: Instant::now(),
            },
        );

        let mut statuses = self.maps.statuses.write().await;
        if let Some(entry) = statuses.get_mut(&request_id) {
            entry.done = true;
            entry.updated_at = Utc::now();
        }
    }

    pub async fn result(&self, request_id: Uuid) -> ResultLookup {
        if let Some(stored) = self.maps.results.read().await.get(&request_id) {
            return match &stored.outcome {
                Ok(response) => ResultLookup::Ready(response.clone()),
                Err(message) => ResultLookup::Failed(message.clone()),
            };
        }

        if self.maps.statuses.read().await.contains_key(&request_id) {
            ResultLookup::Pending
        } else {
            ResultLookup::Unknown
        }
    }

    /// Drop requests that finished more than `ttl` ago, and requests that
    /// never finished and were registered more than `ttl` ago.
    ///
    /// Returns the number of requests removed.
    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        let mut results = self.maps.results.write().await;
        let mut statuses = self.maps.statuses.write().await;

        let mut expired: Vec<Uuid> = results
            .iter()
            .filter(|(_, stored)| stored.finished_at.elapsed() >= ttl)
            .map(|(id, _)| *id)
            .collect();

        // a dropped caller or a panicked pipeline never stores a result
        let now = Utc::now();
        expired.extend(
            statuses
                .iter()
                .filter(|(id, status)| {
                    !results.contains_key(*id)
                        && (now - status.created_at).to_std().unwrap_or_default() >= ttl
                })
                .map(|(id, _)| *id),
        );

        for id in &expired {
            results.remove(id);
            statuses.remove(id);
        }
        expired.len()
    }

    /// Number of tracked requests, finished or not
    pub async fn len(&self) -> usize {
        self.maps.statuses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelResponse;

    fn models() -> Vec<String> {
        vec![
            "openai/gpt-4o:online".to_string(),
            "x-ai/grok-4:online".to_string(),
        ]
    }

    fn response() -> ChatResponse {
        ChatResponse {
            aggregated: "synthesis".to_string(),
            individual: vec![ModelResponse {
                model: "openai/gpt-4o:online".to_string(),
                response: "answer".to_string(),
                tokens: 12,
            }],
        }
    }

    #[tokio::test]
    async fn test_register_starts_everything_pending() {
        let tracker = RequestTracker::new();
        let id = Uuid::new_v4();
        tracker.register(id, &models(), "anthropic/claude-sonnet-4.5").await;

        let status = tracker.status(id).await.unwrap();
        assert_eq!(status.request_id, id);
        assert_eq!(status.models.len(), 2);
        assert!(status.models.iter().all(|m| m.status == Status::Pending));
        assert_eq!(status.models[1].model, "x-ai/grok-4:online");
        assert_eq!(status.aggregation.status, Status::Pending);
        assert!(!status.done);
        assert_eq!(tracker.result(id).await, ResultLookup::Pending);
    }

    #[tokio::test]
    async fn test_model_transitions() {
        let tracker = RequestTracker::new();
        let id = Uuid::new_v4();
        tracker.register(id, &models(), "anthropic/claude-sonnet-4.5").await;

        tracker
            .set_model(id, "openai/gpt-4o:online", Status::Querying, ModelUpdate::default())
            .await;
        tracker
            .set_model(
                id,
                "openai/gpt-4o:online",
                Status::Completed,
                ModelUpdate {
                    tokens: Some(321),
                    error: None,
                    elapsed: Some(Duration::from_millis(1500)),
                },
            )
            .await;
        tracker
            .set_model(
                id,
                "x-ai/grok-4:online",
                Status::Timeout,
                ModelUpdate {
                    error: Some("Request timed out after 120.0 seconds".to_string()),
                    ..ModelUpdate::default()
                },
            )
            .await;

        let status = tracker.status(id).await.unwrap();
        assert_eq!(status.models[0].status, Status::Completed);
        assert_eq!(status.models[0].tokens, Some(321));
        assert_eq!(status.models[0].elapsed_ms, Some(1500));
        assert_eq!(status.models[1].status, Status::Timeout);
        assert!(status.models[1].error.as_deref().unwrap().contains("120"));
        assert!(status.updated_at >= status.created_at);
    }

    #[tokio::test]
    async fn test_updates_for_unknown_requests_are_ignored() {
        let tracker = RequestTracker::new();
        tracker
            .set_model(Uuid::new_v4(), "openai/gpt-4o:online", Status::Error, ModelUpdate::default())
            .await;
        tracker
            .set_aggregation(Uuid::new_v4(), Status::Completed, None)
            .await;
        assert!(tracker.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_result_marks_done() {
        let tracker = RequestTracker::new();
        let id = Uuid::new_v4();
        tracker.register(id, &models(), "anthropic/claude-sonnet-4.5").await;
        tracker.store_result(id, Ok(response())).await;

        assert!(tracker.status(id).await.unwrap().done);
        assert_eq!(tracker.result(id).await, ResultLookup::Ready(response()));
    }

    #[tokio::test]
    async fn test_failed_and_unknown_lookups() {
        let tracker = RequestTracker::new();
        let id = Uuid::new_v4();
        tracker.register(id, &models(), "anthropic/claude-sonnet-4.5").await;
        tracker
            .store_result(id, Err("All model queries failed".to_string()))
            .await;

        assert_eq!(
            tracker.result(id).await,
            ResultLookup::Failed("All model queries failed".to_string())
        );
        assert_eq!(tracker.result(Uuid::new_v4()).await, ResultLookup::Unknown);
    }

    #[tokio::test]
    async fn test_evict_expired_keeps_recent_requests() {
        let tracker = RequestTracker::new();
        let finished = Uuid::new_v4();
        tracker.register(finished, &models(), "anthropic/claude-sonnet-4.5").await;
        tracker.store_result(finished, Ok(response())).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        let running = Uuid::new_v4();
        tracker.register(running, &models(), "anthropic/claude-sonnet-4.5").await;

        assert_eq!(tracker.evict_expired(Duration::from_secs(3600)).await, 0);
        assert_eq!(tracker.evict_expired(Duration::from_millis(30)).await, 1);

        assert_eq!(tracker.result(finished).await, ResultLookup::Unknown);
        assert!(tracker.status(finished).await.is_none());
        assert_eq!(tracker.result(running).await, ResultLookup::Pending);
        assert_eq!(tracker.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_expired_drops_requests_that_never_finished() {
        let tracker = RequestTracker::new();
        let stuck = Uuid::new_v4();
        tracker.register(stuck, &models(), "anthropic/claude-sonnet-4.5").await;
        tracker
            .set_model(stuck, "openai/gpt-4o:online", Status::Querying, ModelUpdate::default())
            .await;

        assert_eq!(tracker.evict_expired(Duration::from_secs(3600)).await, 0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(tracker.evict_expired(Duration::from_millis(20)).await, 1);

        assert_eq!(tracker.result(stuck).await, ResultLookup::Unknown);
        assert!(tracker.is_empty().await);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Querying).unwrap(), "\"querying\"");
        assert_eq!(serde_json::to_string(&Status::Timeout).unwrap(), "\"timeout\"");
    }
}
