use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::interval;
use tokio_stream::wrappers::IntervalStream;
use uuid::Uuid;
use warp::sse::Event;

use crate::council::{RequestStatus, RequestTracker};

/// Create a status SSE event carrying a full snapshot
pub fn create_status_event(status: &RequestStatus) -> Result<Event, Infallible> {
    let payload = serde_json::to_value(status).unwrap_or_default();

    Ok(Event::default()
        .event("status")
        .data(payload.to_string()))
}

/// Create a done SSE event to signal stream completion
pub fn create_done_event(request_id: Uuid) -> Result<Event, Infallible> {
    let payload = serde_json::json!({ "request_id": request_id });

    Ok(Event::default().event("done").data(payload.to_string()))
}

/// Poll the tracker every `every` and emit a snapshot whenever it changes.
///
/// Ends with a `done` event once the result is stored, or immediately if the
/// request is unknown or has been evicted.
pub fn status_event_stream(
    tracker: RequestTracker,
    request_id: Uuid,
    every: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut ticks = IntervalStream::new(interval(every));
        let mut last: Option<RequestStatus> = None;

        while ticks.next().await.is_some() {
            let Some(status) = tracker.status(request_id).await else {
                yield create_done_event(request_id);
                break;
            };

            if last.as_ref() != Some(&status) {
                yield create_status_event(&status);
            }
            if status.done {
                yield create_done_event(request_id);
                break;
            }
            last = Some(status);
        }
    }
}
