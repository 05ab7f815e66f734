//! Service configuration from command-line flags and environment

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::council::catalog::QueryTimeouts;
use crate::council::ServiceSettings;
use crate::llm::openrouter::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Command-line arguments for roundtable
#[derive(Parser, Debug, Clone)]
#[command(name = "roundtable")]
#[command(about = "Fans a prompt out to several LLMs and synthesizes their answers")]
#[command(version)]
pub struct Config {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "ROUNDTABLE_HOST")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "ROUNDTABLE_PORT")]
    pub port: u16,

    /// OpenRouter API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// OpenRouter API root
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "OPENROUTER_BASE_URL")]
    pub base_url: String,

    /// Sent as HTTP-Referer for OpenRouter attribution
    #[arg(long, env = "OPENROUTER_REFERER")]
    pub referer: Option<String>,

    /// Sent as X-Title for OpenRouter attribution
    #[arg(long, env = "OPENROUTER_APP_TITLE")]
    pub app_title: Option<String>,

    /// Deadline for each research model, in seconds
    #[arg(long, default_value = "60", env = "ROUNDTABLE_QUERY_TIMEOUT_SECS")]
    pub query_timeout_secs: u64,

    /// Deadline for slow (Grok) research models, in seconds
    #[arg(long, default_value = "120", env = "ROUNDTABLE_SLOW_QUERY_TIMEOUT_SECS")]
    pub slow_query_timeout_secs: u64,

    /// Deadline for the synthesis call, in seconds
    #[arg(long, default_value = "180", env = "ROUNDTABLE_AGGREGATION_TIMEOUT_SECS")]
    pub aggregation_timeout_secs: u64,

    /// Deadline for prompt optimization, in seconds
    #[arg(long, default_value = "60", env = "ROUNDTABLE_OPTIMIZER_TIMEOUT_SECS")]
    pub optimizer_timeout_secs: u64,

    /// JSON log of completed queries
    #[arg(long, default_value = "query_log.json", env = "ROUNDTABLE_QUERY_LOG")]
    pub query_log: PathBuf,

    /// JSON log of prompt optimizations
    #[arg(long, default_value = "optimization_log.json", env = "ROUNDTABLE_OPTIMIZATION_LOG")]
    pub optimization_log: PathBuf,

    /// How long finished results stay pollable, in seconds
    #[arg(long, default_value = "3600", env = "ROUNDTABLE_RESULT_TTL_SECS")]
    pub result_ttl_secs: u64,

    /// Interval between status events on the SSE endpoint, in milliseconds
    #[arg(long, default_value = "500", env = "ROUNDTABLE_SSE_INTERVAL_MS")]
    pub sse_interval_ms: u64,
}

fn positive_secs(value: u64, name: &'static str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(Duration::from_secs(value))
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn service_settings(&self) -> Result<ServiceSettings, ConfigError> {
        Ok(ServiceSettings {
            query_timeouts: QueryTimeouts {
                default: positive_secs(self.query_timeout_secs, "query timeout")?,
                slow: positive_secs(self.slow_query_timeout_secs, "slow query timeout")?,
            },
            aggregation_timeout: positive_secs(self.aggregation_timeout_secs, "aggregation timeout")?,
            optimizer_timeout: positive_secs(self.optimizer_timeout_secs, "optimizer timeout")?,
        })
    }

    pub fn result_ttl(&self) -> Result<Duration, ConfigError> {
        positive_secs(self.result_ttl_secs, "result TTL")
    }

    pub fn sse_interval(&self) -> Result<Duration, ConfigError> {
        if self.sse_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("SSE interval"));
        }
        Ok(Duration::from_millis(self.sse_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["roundtable", "--api-key", "sk-test"]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.query_log, PathBuf::from("query_log.json"));

        let settings = config.service_settings().unwrap();
        assert_eq!(settings.query_timeouts.default, Duration::from_secs(60));
        assert_eq!(settings.query_timeouts.slow, Duration::from_secs(120));
        assert_eq!(settings.aggregation_timeout, Duration::from_secs(180));
        assert_eq!(config.sse_interval().unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "roundtable",
            "--api-key",
            "sk-test",
            "--host",
            "127.0.0.1",
            "--port",
            "3030",
            "--query-timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(config.socket_addr(), "127.0.0.1:3030".parse().unwrap());
        assert_eq!(
            config.service_settings().unwrap().query_timeouts.default,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config::try_parse_from([
            "roundtable",
            "--api-key",
            "sk-test",
            "--aggregation-timeout-secs",
            "0",
        ])
        .unwrap();
        assert!(matches!(
            config.service_settings(),
            Err(ConfigError::ZeroDuration("aggregation timeout"))
        ));
    }
}
