// Error replies and rejection recovery

use std::convert::Infallible;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Rejection;

use crate::council::ServiceError;
use crate::models::ErrorResponse;

/// `{"detail": ...}` with the given status
pub fn error_reply(status: StatusCode, detail: impl Into<String>) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&ErrorResponse::new(detail)), status)
}

/// Validation problems are the caller's fault, everything else is ours
pub fn service_error_reply(err: &ServiceError) -> WithStatus<Json> {
    let status = match err {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::AllModelsFailed | ServiceError::Optimization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    error_reply(status, err.to_string())
}

/// Turn warp rejections into JSON errors
pub async fn handle_rejection(err: Rejection) -> Result<WithStatus<Json>, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not Found"));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        warn!(error = %e, "Rejected malformed body");
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large"));
    }
    if let Some(e) = err.find::<warp::reject::UnsupportedMediaType>() {
        warn!(error = %e, "Rejected body content type");
        return Ok(error_reply(StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string()));
    }
    if let Some(e) = err.find::<warp::reject::LengthRequired>() {
        warn!(error = %e, "Rejected body without length");
        return Ok(error_reply(StatusCode::LENGTH_REQUIRED, e.to_string()));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"));
    }

    error!(rejection = ?err, "Unhandled rejection");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
    ))
}
