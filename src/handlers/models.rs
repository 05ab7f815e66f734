// GET /api/models and GET /health handlers

use std::convert::Infallible;

use crate::council::catalog::{aggregator_models, DEFAULT_AGGREGATOR, QUERY_MODELS};
use crate::models::ModelsResponse;

pub async fn list_models_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&ModelsResponse {
        models: QUERY_MODELS.to_vec(),
        aggregators: aggregator_models(),
        default_aggregator: DEFAULT_AGGREGATOR,
    }))
}

pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}
