// POST /api/query and POST /api/chat handlers

use std::convert::Infallible;
use tracing::info;
use warp::http::StatusCode;

use crate::council::ResearchService;
use crate::models::{ChatRequest, SubmitResponse};

use super::errors::{error_reply, service_error_reply};

/// Start a query in the background and hand back its identifier
pub async fn submit_query_handler(
    request: ChatRequest,
    service: ResearchService,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /api/query: {} model(s)", request.models.len());

    match service.submit(request).await {
        Ok(request_id) => Ok(warp::reply::with_status(
            warp::reply::json(&SubmitResponse { request_id }),
            StatusCode::ACCEPTED,
        )),
        Err(err) => Ok(error_reply(StatusCode::BAD_REQUEST, err.to_string())),
    }
}

/// Run the whole pipeline before replying
pub async fn chat_handler(
    request: ChatRequest,
    service: ResearchService,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /api/chat: {} model(s)", request.models.len());

    match service.chat(request).await {
        Ok(response) => Ok(warp::reply::with_status(
            warp::reply::json(&response),
            StatusCode::OK,
        )),
        Err(err) => Ok(service_error_reply(&err)),
    }
}
