use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::dao::models::{Player, PlayerId};

use super::{
    RemoteAction, RemoteReply,
    error::{TransportError, TransportResult},
};

/// One row of the remote `Players` sheet.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPlayer {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl From<RowPlayer> for Player {
    fn from(row: RowPlayer) -> Self {
        Self {
            id: row.id,
            name: row.name,
            score: row.score,
            created: parse_timestamp(row.created.as_deref()),
            last_updated: parse_timestamp(row.last_updated.as_deref()),
        }
    }
}

/// Every reply of the row store shares this loose envelope.
#[derive(Debug, Default, Deserialize)]
pub struct RowStoreEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub players: Option<Vec<RowPlayer>>,
    #[serde(default)]
    pub player: Option<RowPlayer>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RowStoreEnvelope {
    /// Check the success flag, surfacing `{error: ...}` replies as rejections.
    pub fn ensure_success(&self, action: &'static str) -> TransportResult<()> {
        if let Some(message) = &self.error {
            return Err(TransportError::Rejected {
                action,
                message: message.clone(),
            });
        }
        if !self.success {
            return Err(TransportError::UnexpectedPayload {
                action,
                expected: "success",
            });
        }
        Ok(())
    }

    /// Interpret the envelope as the reply to `action`.
    pub fn into_reply(self, action: &RemoteAction) -> TransportResult<RemoteReply> {
        let name = action.name();
        self.ensure_success(name)?;

        match action {
            RemoteAction::GetPlayers => self
                .players
                .map(|rows| RemoteReply::Players(rows.into_iter().map(Into::into).collect()))
                .ok_or(TransportError::UnexpectedPayload {
                    action: name,
                    expected: "players",
                }),
            RemoteAction::AddPlayer { .. } | RemoteAction::UpdateScore { .. } => self
                .player
                .map(|row| RemoteReply::Player(row.into()))
                .ok_or(TransportError::UnexpectedPayload {
                    action: name,
                    expected: "player",
                }),
            RemoteAction::RemovePlayer { .. } | RemoteAction::ResetScores => {
                Ok(RemoteReply::Done {
                    message: self.message,
                })
            }
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value.trim(), &Rfc3339).ok())
}
