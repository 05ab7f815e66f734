#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use roundtable::council::catalog::QueryTimeouts;
use roundtable::council::{ResearchService, ServiceSettings};
use roundtable::llm::{
    FinishReason, GenerateRequest, GenerateResponse, LlmError, LlmProvider, UsageMetadata,
};
use roundtable::query_log::QueryLogger;

/// What the fake gateway does for a given model
#[derive(Debug, Clone)]
pub enum Behaviour {
    Answer { text: String, output_tokens: u32 },
    Fail(String),
    Hang,
}

/// In-memory stand-in for the gateway, scripted per model
#[derive(Default)]
pub struct FakeProvider {
    behaviours: HashMap<String, Behaviour>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, model: &str, text: &str, output_tokens: u32) -> Self {
        self.behaviours.insert(
            model.to_string(),
            Behaviour::Answer {
                text: text.to_string(),
                output_tokens,
            },
        );
        self
    }

    pub fn fail(mut self, model: &str, message: &str) -> Self {
        self.behaviours
            .insert(model.to_string(), Behaviour::Fail(message.to_string()));
        self
    }

    pub fn hang(mut self, model: &str) -> Self {
        self.behaviours.insert(model.to_string(), Behaviour::Hang);
        self
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> Vec<GenerateRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.model == model)
            .collect()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.calls.lock().unwrap().push(request.clone());

        let behaviour = self
            .behaviours
            .get(&request.model)
            .cloned()
            .unwrap_or(Behaviour::Answer {
                text: format!("default answer from {}", request.model),
                output_tokens: 1,
            });

        match behaviour {
            Behaviour::Answer {
                text,
                output_tokens,
            } => Ok(GenerateResponse {
                content: text,
                usage: Some(UsageMetadata::new(100, output_tokens)),
                finish_reason: FinishReason::Stop,
            }),
            Behaviour::Fail(message) => Err(LlmError::ProviderError {
                code: "500".to_string(),
                message,
            }),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Timeout(Duration::from_secs(3600)))
            }
        }
    }
}

/// Short deadlines so hanging models time out quickly
pub fn fast_settings() -> ServiceSettings {
    ServiceSettings {
        query_timeouts: QueryTimeouts {
            default: Duration::from_millis(200),
            slow: Duration::from_millis(400),
        },
        aggregation_timeout: Duration::from_millis(200),
        optimizer_timeout: Duration::from_millis(200),
    }
}

/// A service writing its logs into a fresh temp dir
pub fn build_service(provider: Arc<FakeProvider>) -> (ResearchService, QueryLogger, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let logger = QueryLogger::new(
        dir.path().join("query_log.json"),
        dir.path().join("optimization_log.json"),
    );
    let service = ResearchService::new(provider, logger.clone(), fast_settings());
    (service, logger, dir)
}

/// Poll until the request reports done
pub async fn wait_until_done(service: &ResearchService, request_id: Uuid) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(status) = service.tracker().status(request_id).await {
                if status.done {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("request did not finish in time");
}
