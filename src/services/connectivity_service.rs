use std::time::Duration;

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    dto::events::NoticeLevel,
    services::{event_service, sync_service},
    state::{Connectivity, SharedState, Transition},
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Apply a connectivity observation, announcing flips and syncing on reconnect.
pub async fn apply_connectivity(state: &SharedState, online: bool) -> Transition {
    let next = Connectivity::from_online(online);
    let transition = state.set_connectivity(next);
    match transition {
        Transition::WentOnline => {
            info!("remote store reachable; leaving offline mode");
            event_service::broadcast_connectivity(state, next);
            event_service::notify(state, NoticeLevel::Success, "Back online! Syncing data...");
            sync_service::sync_with_server(state).await;
        }
        Transition::WentOffline => {
            warn!("remote store unreachable; entering offline mode");
            event_service::broadcast_connectivity(state, next);
            event_service::notify(
                state,
                NoticeLevel::Info,
                "Working offline. Changes will sync when back online.",
            );
        }
        Transition::Unchanged => {}
    }
    transition
}

/// Probe the remote store forever, keeping the connectivity flag current.
///
/// Healthy probes repeat every `probe_interval`; failed ones back off
/// exponentially. Returns immediately when no remote store is configured.
pub async fn run(state: SharedState, probe_interval: Duration) {
    let Some(remote) = state.remote() else {
        debug!("no remote store configured; connectivity supervisor idle");
        return;
    };
    let mut delay = INITIAL_DELAY;

    loop {
        match remote.health_check().await {
            Ok(()) => {
                apply_connectivity(&state, true).await;
                delay = INITIAL_DELAY;
                sleep(probe_interval).await;
            }
            Err(err) => {
                if state.is_online() {
                    warn!(error = %err, "remote store probe failed");
                } else {
                    debug!(error = %err, retry_in = ?delay, "remote store still unreachable");
                }
                apply_connectivity(&state, false).await;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Spawn [`run`] on the runtime.
pub fn spawn_supervisor(state: SharedState, probe_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(run(state, probe_interval))
}
