// POST /api/optimize handler

use std::convert::Infallible;
use tracing::info;
use warp::http::StatusCode;

use crate::council::ResearchService;
use crate::models::OptimizeRequest;

use super::errors::service_error_reply;

pub async fn optimize_handler(
    request: OptimizeRequest,
    service: ResearchService,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /api/optimize: {} chars", request.prompt.len());

    match service.optimize(&request.prompt).await {
        Ok(response) => Ok(warp::reply::with_status(
            warp::reply::json(&response),
            StatusCode::OK,
        )),
        Err(err) => Ok(service_error_reply(&err)),
    }
}
