//! Core abstractions for the LLM layer

pub mod config;
pub mod error;
pub mod provider;
pub mod types;
