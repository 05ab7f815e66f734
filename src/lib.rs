// HTTP Server modules
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;

pub mod config;

// Fan-out, tracking and synthesis
pub mod council;
pub mod query_log;

// LLM abstraction layer
pub mod llm;
