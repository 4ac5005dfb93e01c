//! Server-Sent Events streams

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use civic_common::events::CivicEvent;
use civic_common::sse::create_event_sse_stream;
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /imports/events - import lifecycle and progress
///
/// Streams ImportStarted, ImportProgressUpdate, ImportFinished and
/// ImportFailed.
pub async fn import_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_event_sse_stream("import", &state.event_bus, CivicEvent::is_import_event)
}

/// GET /events - every event, including position assignments
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_event_sse_stream("all", &state.event_bus, |_| true)
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/imports/events", get(import_event_stream))
        .route("/events", get(event_stream))
}
