//! Multi-model research: fan a prompt out, track it, synthesize the answers
//!
//! - [`catalog`]: which models may be used, and how long each may take
//! - [`fanout`]: concurrent per-model calls
//! - [`tracker`]: status and result maps polled by the frontend
//! - [`aggregate`]: the synthesis call
//! - [`optimize`]: prompt rewriting
//! - [`service`]: ties the above together for the HTTP layer

pub mod aggregate;
pub mod catalog;
pub mod fanout;
pub mod optimize;
pub mod service;
pub mod tracker;

pub use service::{ResearchService, ServiceError, ServiceSettings, ValidationError};
pub use tracker::{RequestStatus, RequestTracker, ResultLookup, Status};
