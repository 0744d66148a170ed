mod bridge;
mod config;
mod error;
mod models;
mod store;

pub use bridge::{CALLBACK_PREFIX, CallbackRegistry, PendingCallback};
pub use config::{PLACEHOLDER_URL, RemoteConfig, TransportStrategy};
pub use error::{TransportError, TransportResult};
pub use store::HttpRemoteStore;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::dao::models::{Player, PlayerId};

/// Closed set of operations understood by the remote row store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RemoteAction {
    /// Fetch the full player list.
    GetPlayers,
    /// Create a player; the store assigns the identifier.
    AddPlayer { name: String },
    /// Overwrite a player's score with an absolute value.
    UpdateScore { id: PlayerId, score: u32 },
    /// Delete a player row.
    RemovePlayer { id: PlayerId },
    /// Zero every score.
    ResetScores,
}

impl RemoteAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            RemoteAction::GetPlayers => "getPlayers",
            RemoteAction::AddPlayer { .. } => "addPlayer",
            RemoteAction::UpdateScore { .. } => "updateScore",
            RemoteAction::RemovePlayer { .. } => "removePlayer",
            RemoteAction::ResetScores => "resetScores",
        }
    }

    /// Query-string pairs for the GET based strategies, `action` first.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("action", self.name().to_string())];
        match self {
            RemoteAction::GetPlayers | RemoteAction::ResetScores => {}
            RemoteAction::AddPlayer { name } => pairs.push(("name", name.clone())),
            RemoteAction::UpdateScore { id, score } => {
                pairs.push(("id", id.to_string()));
                pairs.push(("score", score.to_string()));
            }
            RemoteAction::RemovePlayer { id } => pairs.push(("id", id.to_string())),
        }
        pairs
    }
}

/// Decoded, action-specific reply of the row store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteReply {
    Players(Vec<Player>),
    Player(Player),
    Done { message: Option<String> },
}

/// Abstraction over the remote authoritative copy of the player list.
pub trait RemoteStore: Send + Sync {
    /// Issue one action and decode its reply.
    fn call(&self, action: RemoteAction) -> BoxFuture<'static, TransportResult<RemoteReply>>;
    /// Cheap reachability probe.
    fn health_check(&self) -> BoxFuture<'static, TransportResult<()>>;
}

impl dyn RemoteStore {
    /// Fetch the remote player list.
    pub async fn get_players(&self) -> TransportResult<Vec<Player>> {
        match self.call(RemoteAction::GetPlayers).await? {
            RemoteReply::Players(players) => Ok(players),
            _ => Err(unexpected("getPlayers", "players")),
        }
    }

    /// Create a player remotely, returning the row as stored.
    pub async fn add_player(&self, name: &str) -> TransportResult<Player> {
        let action = RemoteAction::AddPlayer {
            name: name.to_string(),
        };
        match self.call(action).await? {
            RemoteReply::Player(player) => Ok(player),
            _ => Err(unexpected("addPlayer", "player")),
        }
    }

    /// Store an absolute score for `id`.
    pub async fn update_score(&self, id: PlayerId, score: u32) -> TransportResult<Player> {
        match self.call(RemoteAction::UpdateScore { id, score }).await? {
            RemoteReply::Player(player) => Ok(player),
            _ => Err(unexpected("updateScore", "player")),
        }
    }

    /// Delete the row for `id`.
    pub async fn remove_player(&self, id: PlayerId) -> TransportResult<()> {
        self.call(RemoteAction::RemovePlayer { id }).await.map(drop)
    }

    /// Zero every remote score.
    pub async fn reset_scores(&self) -> TransportResult<()> {
        self.call(RemoteAction::ResetScores).await.map(drop)
    }
}

fn unexpected(action: &'static str, expected: &'static str) -> TransportError {
    TransportError::UnexpectedPayload { action, expected }
}
