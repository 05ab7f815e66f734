// Route definitions and handlers

use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;
use warp::Filter;

use crate::council::ResearchService;
use crate::handlers;

/// Largest accepted JSON body
const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn with_service(
    service: ResearchService,
) -> impl Filter<Extract = (ResearchService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

pub fn configure_routes(
    service: ResearchService,
    sse_interval: Duration,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let api = warp::path("api");

    // GET /api/models
    let list_models = api
        .and(warp::path("models"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::list_models_handler);

    // POST /api/query
    let submit_query = api
        .and(warp::path("query"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and_then(handlers::submit_query_handler);

    // GET /api/status/{requestId}
    let get_status = api
        .and(warp::path("status"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::get_status_handler);

    // GET /api/status/{requestId}/events
    let status_events = api
        .and(warp::path("status"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path("events"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_service(service.clone()))
        .and(warp::any().map(move || sse_interval))
        .and_then(handlers::status_events_handler);

    // GET /api/result/{requestId}
    let get_result = api
        .and(warp::path("result"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::get_result_handler);

    // POST /api/chat
    let chat = api
        .and(warp::path("chat"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and_then(handlers::chat_handler);

    // POST /api/optimize
    let optimize = api
        .and(warp::path("optimize"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_service(service))
        .and_then(handlers::optimize_handler);

    // GET /health
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    // Combine routes
    list_models
        .or(submit_query)
        .or(get_status)
        .or(status_events)
        .or(get_result)
        .or(chat)
        .or(optimize)
        .or(health)
        .recover(handlers::handle_rejection)
}
