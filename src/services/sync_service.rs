use std::time::Duration;

use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{services::event_service, state::SharedState};

/// What a single reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Offline or no remote store configured.
    Skipped,
    /// The remote list matched the board.
    Unchanged,
    /// The board now mirrors the remote list.
    Replaced { players: usize },
    /// The fetch failed; the board was left alone.
    Failed,
}

/// Pull the remote player list and overwrite the board when it differs.
///
/// The remote copy wins: local-only players vanish if the remote list lacks them.
pub async fn sync_with_server(state: &SharedState) -> SyncOutcome {
    let Some(remote) = state.reachable_remote() else {
        return SyncOutcome::Skipped;
    };

    let players = match remote.get_players().await {
        Ok(players) => players,
        Err(err) => {
            warn!(error = %err, "failed to fetch remote player list");
            return SyncOutcome::Failed;
        }
    };

    let count = players.len();
    let replaced = state
        .with_board_mut(|board| board.replace_players(players))
        .await;
    if !replaced {
        debug!(players = count, "remote player list unchanged");
        return SyncOutcome::Unchanged;
    }

    info!(players = count, "board replaced from remote store");
    state.persist().await;
    event_service::broadcast_players_changed(state).await;
    SyncOutcome::Replaced { players: count }
}

/// Handle to the periodic poll; aborts the task when stopped or dropped.
pub struct SyncTask {
    handle: JoinHandle<()>,
}

impl SyncTask {
    /// Cancel the poll loop.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start polling the remote store every `period`, skipping ticks while offline.
pub fn spawn_poller(state: SharedState, period: Duration) -> SyncTask {
    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; startup already has fresh state
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !state.is_online() {
                debug!("offline; skipping scheduled sync");
                continue;
            }
            sync_with_server(&state).await;
        }
    });
    SyncTask { handle }
}
