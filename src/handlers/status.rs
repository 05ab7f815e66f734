// GET /api/status/{id}, /api/status/{id}/events and /api/result/{id} handlers

use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use warp::http::StatusCode;

use crate::council::{ResearchService, ResultLookup};
use crate::models::ProcessingResponse;
use crate::sse::status_event_stream;

use super::errors::error_reply;

const UNKNOWN_REQUEST: &str = "Request not found";

pub async fn get_status_handler(
    request_id: Uuid,
    service: ResearchService,
) -> Result<impl warp::Reply, Infallible> {
    debug!("GET /api/status/{}", request_id);

    match service.tracker().status(request_id).await {
        Some(status) => Ok(warp::reply::with_status(
            warp::reply::json(&status),
            StatusCode::OK,
        )),
        None => Ok(error_reply(StatusCode::NOT_FOUND, UNKNOWN_REQUEST)),
    }
}

/// Server-sent status snapshots until the request finishes
pub async fn status_events_handler(
    request_id: Uuid,
    service: ResearchService,
    every: Duration,
) -> Result<impl warp::Reply, Infallible> {
    debug!("GET /api/status/{}/events", request_id);

    let stream = status_event_stream(service.tracker().clone(), request_id, every);
    Ok(warp::sse::reply(warp::sse::keep_alive().stream(stream)))
}

pub async fn get_result_handler(
    request_id: Uuid,
    service: ResearchService,
) -> Result<impl warp::Reply, Infallible> {
    debug!("GET /api/result/{}", request_id);

    let reply = match service.tracker().result(request_id).await {
        ResultLookup::Ready(response) => {
            warp::reply::with_status(warp::reply::json(&response), StatusCode::OK)
        }
        ResultLookup::Pending => warp::reply::with_status(
            warp::reply::json(&ProcessingResponse {
                request_id,
                status: "processing",
            }),
            StatusCode::ACCEPTED,
        ),
        ResultLookup::Failed(message) => error_reply(StatusCode::INTERNAL_SERVER_ERROR, message),
        ResultLookup::Unknown => error_reply(StatusCode::NOT_FOUND, UNKNOWN_REQUEST),
    };
    Ok(reply)
}
