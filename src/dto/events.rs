use serde::Serialize;
use uuid::Uuid;

use crate::{dao::models::PlayerId, state::Connectivity};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the event stream.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl NoticeLevel {
    /// Event name the notice is published under.
    pub fn event_name(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        }
    }
}

#[derive(Debug, Serialize)]
/// Transient message for the presentation layer to show.
pub struct NoticeEvent {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// Sent when a score increase puts a player at the top of the board.
pub struct LeaderChangedEvent {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Serialize)]
/// Broadcast when the remote store becomes reachable or unreachable.
pub struct ConnectivityEvent {
    pub online: bool,
    pub connectivity: Connectivity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// Initial metadata sent to a subscriber when it connects.
pub struct Handshake {
    pub stream_id: Uuid,
    pub message: String,
    pub online: bool,
}
