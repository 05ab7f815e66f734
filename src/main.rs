use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roundtable::config::Config;
use roundtable::council::ResearchService;
use roundtable::llm::OpenRouterClient;
use roundtable::llm::openrouter::DEFAULT_REQUEST_TIMEOUT;
use roundtable::query_log::QueryLogger;
use roundtable::routes::configure_routes;

/// How often finished requests are checked for expiry
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roundtable=info,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let settings = config.service_settings()?;

    let provider = OpenRouterClient::with_options(
        config.api_key.clone(),
        config.base_url.clone(),
        DEFAULT_REQUEST_TIMEOUT,
        config.referer.clone(),
        config.app_title.clone(),
    )
    .context("Failed to create OpenRouter client")?;
    info!("Using OpenRouter at {}", config.base_url);

    let logger = QueryLogger::new(config.query_log.clone(), config.optimization_log.clone());
    let service = ResearchService::new(Arc::new(provider), logger, settings);
    let eviction = service.spawn_eviction(config.result_ttl()?, EVICTION_INTERVAL);

    let routes = configure_routes(service, config.sse_interval()?);
    let addr = config.socket_addr();

    info!("Starting server on http://{}", addr);
    tokio::select! {
        _ = warp::serve(routes).run(addr) => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    eviction.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
