//! Append-only JSON logs of queries and prompt optimizations
//!
//! Each log is a single file holding a pretty-printed JSON array, rewritten
//! on every append. Writes go through one async mutex so concurrent requests
//! never interleave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::council::fanout::ModelAnswer;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub model: String,
    pub response: String,
    pub tokens: u32,
    pub error: Option<String>,
}

impl From<&ModelAnswer> for IndividualRecord {
    fn from(answer: &ModelAnswer) -> Self {
        Self {
            model: answer.model.clone(),
            response: answer.response.clone(),
            tokens: answer.tokens,
            error: answer.error.clone(),
        }
    }
}

/// One completed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub timestamp: DateTime<Utc>,
    pub user_prompt: String,
    pub models_used: Vec<String>,
    pub aggregator: String,
    pub individual_responses: Vec<IndividualRecord>,
    pub aggregated_response: String,
    pub total_tokens: u64,
}

impl QueryRecord {
    pub fn new(
        user_prompt: &str,
        models_used: &[String],
        aggregator: &str,
        answers: &[ModelAnswer],
        aggregated_response: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_prompt: user_prompt.to_string(),
            models_used: models_used.to_vec(),
            aggregator: aggregator.to_string(),
            individual_responses: answers.iter().map(IndividualRecord::from).collect(),
            aggregated_response: aggregated_response.to_string(),
            total_tokens: answers.iter().map(|a| u64::from(a.tokens)).sum(),
        }
    }
}

/// One prompt optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub timestamp: DateTime<Utc>,
    pub original: String,
    pub optimized: String,
    pub model: String,
    pub tokens: u32,
}

/// A flat file holding a JSON array of records
#[derive(Debug, Clone)]
pub struct JsonLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-modify-write append. A missing or corrupt file starts a fresh array.
    pub async fn append<T: Serialize>(&self, record: &T) -> Result<(), LogError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await;
        entries.push(serde_json::to_value(record)?);

        let encoded = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, encoded)
            .await
            .map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), entries = entries.len(), "Appended log record");
        Ok(())
    }

    /// All records currently in the file
    pub async fn entries(&self) -> Vec<serde_json::Value> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }

    async fn read_entries(&self) -> Vec<serde_json::Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), error = %err, "Log file unreadable, starting over");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }
}

/// The two logs the service writes
#[derive(Debug, Clone)]
pub struct QueryLogger {
    queries: JsonLog,
    optimizations: JsonLog,
}

impl QueryLogger {
    pub fn new(query_log: impl Into<PathBuf>, optimization_log: impl Into<PathBuf>) -> Self {
        Self {
            queries: JsonLog::new(query_log),
            optimizations: JsonLog::new(optimization_log),
        }
    }

    pub fn queries(&self) -> &JsonLog {
        &self.queries
    }

    pub fn optimizations(&self) -> &JsonLog {
        &self.optimizations
    }

    /// Failures are logged, never returned: logging must not fail a request
    pub async fn log_query(&self, record: &QueryRecord) {
        if let Err(err) = self.queries.append(record).await {
            warn!(error = %err, "Failed to write query log");
        }
    }

    pub async fn log_optimization(&self, record: &OptimizationRecord) {
        if let Err(err) = self.optimizations.append(record).await {
            warn!(error = %err, "Failed to write optimization log");
        }
    }
}
