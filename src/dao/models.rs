use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use time::OffsetDateTime;

/// Opaque player identifier, derived from the creation timestamp in Unix milliseconds.
///
/// The row store may hand identifiers back either as JSON numbers or as numeric strings,
/// both forms decode to the same value.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PlayerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A contestant tracked by the scoreboard.
///
/// The leader flag is never stored here: it is derived from the whole board on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique identifier within the board.
    pub id: PlayerId,
    /// Display name, unique case-insensitively.
    pub name: String,
    /// Wings eaten so far. Never negative.
    pub score: u32,
    /// Creation timestamp, when known.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<OffsetDateTime>,
    /// Last time the score or name changed, when known.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<OffsetDateTime>,
}

impl Player {
    /// Build a player that only exists locally, stamped with `now`.
    pub fn local(id: PlayerId, name: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            created: Some(now),
            last_updated: Some(now),
        }
    }

    /// Compare the fields that matter for reconciliation (identity, name and score).
    pub fn same_standing(&self, other: &Player) -> bool {
        self.id == other.id && self.name == other.name && self.score == other.score
    }
}

/// Score a player held before a bulk reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorScore {
    /// Player the score belonged to.
    pub id: PlayerId,
    /// Score before the reset.
    pub score: u32,
}

/// Invertible record of a board mutation, kept for undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ActionRecord {
    /// A player joined; undo removes it by id.
    AddPlayer {
        /// The player as inserted.
        player: Player,
    },
    /// A player left; undo re-inserts it at `index`.
    RemovePlayer {
        /// The player as it was before removal.
        player: Player,
        /// Position the player occupied in the board.
        index: usize,
    },
    /// A single score moved; undo restores `old_score`.
    ScoreChange {
        /// Player whose score changed.
        player_id: PlayerId,
        /// Score before the change.
        old_score: u32,
        /// Score after the change.
        new_score: u32,
    },
    /// Every score went back to zero; undo restores each prior score.
    ResetScores {
        /// Scores held right before the reset.
        old_scores: Vec<PriorScore>,
    },
}

impl ActionRecord {
    /// Short machine-friendly label, used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionRecord::AddPlayer { .. } => "add_player",
            ActionRecord::RemovePlayer { .. } => "remove_player",
            ActionRecord::ScoreChange { .. } => "score_change",
            ActionRecord::ResetScores { .. } => "reset_scores",
        }
    }
}

/// Everything written to the durable local slot, as a single blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    /// Players in board order.
    #[serde(default)]
    pub players: Vec<Player>,
    /// Undo log, oldest first.
    #[serde(default)]
    pub action_history: Vec<ActionRecord>,
    /// Elapsed challenge time reported by the presentation layer.
    #[serde(default, alias = "timer")]
    pub elapsed_seconds: u64,
}
