use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::event_service, state::SharedState};

/// Stream scoreboard events to a connected presentation layer.
pub async fn event_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = event_service::subscribe(&state);
    let stream_id = Uuid::new_v4();
    info!(%stream_id, "new event stream connection");
    event_service::broadcast_handshake(&state, stream_id);
    event_service::to_sse_stream(receiver, stream_id)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(event_stream))
}
