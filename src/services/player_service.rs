use std::{future::Future, sync::Arc};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{ActionRecord, Player, PlayerId},
        remote_store::{RemoteStore, TransportResult},
    },
    dto::{events::NoticeLevel, validation::validate_player_name},
    error::ServiceError,
    services::event_service,
    state::{SharedState, board::{BoardError, apply_delta}},
};

/// How a mutation ended up being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The remote store accepted the change and the board mirrors it.
    Synced,
    /// Only the board changed: offline, unconfigured, or the remote call failed.
    LocalOnly,
    /// Nothing changed because the player is gone.
    Ignored,
}

/// Result of a single-player mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub outcome: Outcome,
    /// The player after the change (before removal, for removals).
    pub player: Option<Player>,
}

impl Mutation {
    fn ignored() -> Self {
        Self {
            outcome: Outcome::Ignored,
            player: None,
        }
    }
}

enum Attempt<T> {
    Confirmed(T),
    Failed,
    Skipped,
}

impl<T> Attempt<T> {
    fn outcome(&self) -> Outcome {
        match self {
            Attempt::Confirmed(_) => Outcome::Synced,
            Attempt::Failed | Attempt::Skipped => Outcome::LocalOnly,
        }
    }
}

/// Try the remote store when it is reachable, logging failures instead of propagating them.
async fn attempt_remote<T, F, Fut>(state: &SharedState, action: &'static str, call: F) -> Attempt<T>
where
    F: FnOnce(Arc<dyn RemoteStore>) -> Fut,
    Fut: Future<Output = TransportResult<T>>,
{
    let Some(remote) = state.reachable_remote() else {
        debug!(action, "remote store unavailable; applying locally");
        return Attempt::Skipped;
    };
    match call(remote).await {
        Ok(value) => Attempt::Confirmed(value),
        Err(err) => {
            warn!(action, error = %err, "remote store call failed; applying locally");
            Attempt::Failed
        }
    }
}

fn now_ms(now: OffsetDateTime) -> u64 {
    u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

/// Add a contestant, remote first, falling back to a locally allocated id.
pub async fn add_player(state: &SharedState, name: &str) -> Result<Mutation, ServiceError> {
    if let Err(err) = validate_player_name(name) {
        let message = err
            .message
            .as_deref()
            .unwrap_or("Please enter a player name")
            .to_string();
        event_service::notify(state, NoticeLevel::Error, message.clone());
        return Err(ServiceError::InvalidInput(message));
    }
    let name = name.trim();

    if state.read_board(|board| board.contains_name(name)).await {
        return Err(reject_duplicate(state, name));
    }

    let attempt = attempt_remote(state, "addPlayer", |remote| async move {
        remote.add_player(name).await
    })
    .await;
    let outcome = attempt.outcome();
    let remote_player = match attempt {
        Attempt::Confirmed(player) => Some(player),
        Attempt::Failed | Attempt::Skipped => None,
    };

    let now = OffsetDateTime::now_utc();
    let inserted = state
        .with_board_mut(|board| {
            let player = match remote_player {
                Some(player) => player,
                None => Player::local(board.next_local_id(now_ms(now)), name, now),
            };
            board.add_player(player.clone()).map(|()| player)
        })
        .await;

    let player = match inserted {
        Ok(player) => player,
        Err(BoardError::DuplicateId(id)) => {
            // A concurrent sync already pulled the new row in.
            debug!(%id, "player already present after remote add");
            let existing = state.read_board(|board| board.player(id).cloned()).await;
            return Ok(Mutation {
                outcome,
                player: existing,
            });
        }
        Err(BoardError::DuplicateName(_)) => return Err(reject_duplicate(state, name)),
    };

    info!(id = %player.id, name = %player.name, ?outcome, "player added");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    match outcome {
        Outcome::Synced => event_service::notify(
            state,
            NoticeLevel::Success,
            format!("{} added to the challenge!", player.name),
        ),
        _ => event_service::notify(
            state,
            NoticeLevel::Info,
            format!("{} added locally!", player.name),
        ),
    }

    Ok(Mutation {
        outcome,
        player: Some(player),
    })
}

fn reject_duplicate(state: &SharedState, name: &str) -> ServiceError {
    event_service::notify(state, NoticeLevel::Error, "Player already exists");
    ServiceError::from(BoardError::DuplicateName(name.to_string()))
}

/// Move a player's score by `delta`, flooring at zero. Unknown ids are ignored.
pub async fn update_score(state: &SharedState, id: PlayerId, delta: i64) -> Mutation {
    let Some(current) = state.read_board(|board| board.player(id).map(|p| p.score)).await else {
        debug!(%id, "score change for unknown player ignored");
        return Mutation::ignored();
    };
    let target = apply_delta(current, delta);

    let attempt = attempt_remote(state, "updateScore", |remote| async move {
        remote.update_score(id, target).await
    })
    .await;
    let outcome = attempt.outcome();
    let confirmed = matches!(attempt, Attempt::Confirmed(_));

    let now = OffsetDateTime::now_utc();
    let applied = state
        .with_board_mut(|board| {
            let live = board.player(id)?.score;
            // Local-only changes apply the delta to the live score.
            let score = if confirmed {
                target
            } else {
                apply_delta(live, delta)
            };
            let moved = board.set_score(id, score, now)?;
            let took_lead = moved.new_score > moved.old_score && board.is_leading(id);
            board.player(id).cloned().map(|player| (player, took_lead))
        })
        .await;
    let Some((player, took_lead)) = applied else {
        debug!(%id, "player removed while its score was being updated");
        return Mutation::ignored();
    };

    debug!(%id, score = player.score, ?outcome, "score updated");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    if took_lead {
        event_service::broadcast_leader_changed(state, &player);
    }
    if matches!(attempt, Attempt::Failed) {
        event_service::notify(
            state,
            NoticeLevel::Info,
            format!("{}'s score updated locally", player.name),
        );
    }

    Mutation {
        outcome,
        player: Some(player),
    }
}

/// Remove a contestant. Unknown ids are ignored.
pub async fn remove_player(state: &SharedState, id: PlayerId) -> Mutation {
    if state.read_board(|board| board.player(id).is_none()).await {
        debug!(%id, "removal of unknown player ignored");
        return Mutation::ignored();
    }

    let attempt = attempt_remote(state, "removePlayer", |remote| async move {
        remote.remove_player(id).await
    })
    .await;
    let outcome = attempt.outcome();

    let Some((index, player)) = state.with_board_mut(|board| board.remove_player(id)).await
    else {
        return Mutation::ignored();
    };

    info!(%id, index, ?outcome, "player removed");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    match outcome {
        Outcome::Synced => event_service::notify(
            state,
            NoticeLevel::Success,
            format!("{} removed from challenge", player.name),
        ),
        _ => event_service::notify(
            state,
            NoticeLevel::Info,
            format!("{} removed locally", player.name),
        ),
    }

    Mutation {
        outcome,
        player: Some(player),
    }
}

/// Zero every score. Refused unless the caller confirmed the reset.
pub async fn reset_scores(state: &SharedState, confirmed: bool) -> Result<Outcome, ServiceError> {
    if !confirmed {
        return Err(ServiceError::ConfirmationRequired);
    }

    let attempt = attempt_remote(state, "resetScores", |remote| async move {
        remote.reset_scores().await
    })
    .await;
    let outcome = attempt.outcome();

    let now = OffsetDateTime::now_utc();
    let prior = state.with_board_mut(|board| board.reset_scores(now)).await;

    info!(players = prior.len(), ?outcome, "scores reset");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    match outcome {
        Outcome::Synced => event_service::notify(state, NoticeLevel::Success, "All scores reset!"),
        _ => event_service::notify(state, NoticeLevel::Info, "Scores reset locally!"),
    }

    Ok(outcome)
}

/// Revert the most recent recorded action. Never touches the remote store.
pub async fn undo_last_action(state: &SharedState) -> Result<ActionRecord, ServiceError> {
    let Some(record) = state.with_board_mut(|board| board.undo()).await else {
        event_service::notify(state, NoticeLevel::Error, "Nothing to undo");
        return Err(ServiceError::NothingToUndo);
    };

    info!(kind = record.kind(), "action undone");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    event_service::notify(state, NoticeLevel::Success, "Action undone");

    Ok(record)
}

/// Store the elapsed challenge time reported by the presentation layer.
pub async fn set_elapsed_seconds(state: &SharedState, seconds: u64) {
    state
        .with_board_mut(|board| board.set_elapsed_seconds(seconds))
        .await;
    state.persist().await;
}
