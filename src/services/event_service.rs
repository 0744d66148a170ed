use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::Player,
    dto::{
        board::BoardView,
        events::{ConnectivityEvent, Handshake, LeaderChangedEvent, NoticeEvent, NoticeLevel, ServerEvent},
    },
    state::{Connectivity, SharedState},
};

pub const EVENT_PLAYERS_CHANGED: &str = "players.changed";
pub const EVENT_LEADER_CHANGED: &str = "leader.changed";
pub const EVENT_CONNECTIVITY: &str = "connectivity";
pub const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the presentation event stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events().subscribe()
}

/// Broadcast the full board after any change to the player list.
pub async fn broadcast_players_changed(state: &SharedState) {
    let view = state.read_board(|board| BoardView::from(board)).await;
    send_event(state, EVENT_PLAYERS_CHANGED, &view);
}

/// Announce a new leader, both as a structured event and as a notice.
pub fn broadcast_leader_changed(state: &SharedState, player: &Player) {
    let payload = LeaderChangedEvent {
        player_id: player.id,
        name: player.name.clone(),
        score: player.score,
    };
    send_event(state, EVENT_LEADER_CHANGED, &payload);
    notify(
        state,
        NoticeLevel::Success,
        format!("🎉 {} takes the lead with {} wings!", player.name, player.score),
    );
}

/// Broadcast a connectivity flip.
pub fn broadcast_connectivity(state: &SharedState, connectivity: Connectivity) {
    let payload = ConnectivityEvent {
        online: connectivity.is_online(),
        connectivity,
    };
    send_event(state, EVENT_CONNECTIVITY, &payload);
}

/// Publish a transient user-facing notice under its level's event name.
pub fn notify(state: &SharedState, level: NoticeLevel, message: impl Into<String>) {
    let payload = NoticeEvent {
        level,
        message: message.into(),
    };
    debug!(level = level.event_name(), message = %payload.message, "notice");
    send_event(state, level.event_name(), &payload);
}

/// Send the greeting a fresh subscriber sees first.
pub fn broadcast_handshake(state: &SharedState, stream_id: Uuid) {
    let payload = Handshake {
        stream_id,
        message: "event stream connected".into(),
        online: state.is_online(),
    };
    send_event(state, EVENT_HANDSHAKE, &payload);
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// logging once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    stream_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(%stream_id, skipped, "event subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }
        info!(%stream_id, "event stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize event payload"),
    }
}
