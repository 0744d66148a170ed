pub mod board;
pub mod connectivity;
mod events;
pub mod history;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, warn};

use crate::dao::{local_store::SnapshotStore, remote_store::RemoteStore};

pub use self::board::Board;
pub use self::connectivity::{Connectivity, Transition};
pub use self::events::EventHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the presentation event channel.
const EVENT_CAPACITY: usize = 64;

/// Central application state: the board, its stores and the event fan-out.
pub struct AppState {
    board: RwLock<Board>,
    remote: Option<Arc<dyn RemoteStore>>,
    snapshots: Arc<dyn SnapshotStore>,
    connectivity: watch::Sender<Connectivity>,
    events: EventHub,
    persist_gate: Mutex<()>,
}

impl AppState {
    /// Construct an empty [`AppState`] wrapped in an [`Arc`].
    ///
    /// Starts online; the connectivity supervisor corrects this on its first probe.
    pub fn new(
        remote: Option<Arc<dyn RemoteStore>>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> SharedState {
        Self::with_board(Board::new(), remote, snapshots)
    }

    /// Construct the state from whatever the local slot holds, or an empty board.
    pub async fn restore(
        remote: Option<Arc<dyn RemoteStore>>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> SharedState {
        let board = match snapshots.load().await {
            Some(snapshot) => {
                debug!(
                    players = snapshot.players.len(),
                    history = snapshot.action_history.len(),
                    "restored local snapshot"
                );
                Board::from_snapshot(snapshot)
            }
            None => Board::new(),
        };
        Self::with_board(board, remote, snapshots)
    }

    fn with_board(
        board: Board,
        remote: Option<Arc<dyn RemoteStore>>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> SharedState {
        let (connectivity, _rx) = watch::channel(Connectivity::Online);
        Arc::new(Self {
            board: RwLock::new(board),
            remote,
            snapshots,
            connectivity,
            events: EventHub::new(EVENT_CAPACITY),
            persist_gate: Mutex::new(()),
        })
    }

    /// Configured remote store, regardless of connectivity.
    pub fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.remote.clone()
    }

    /// Remote store to use right now: configured and believed reachable.
    pub fn reachable_remote(&self) -> Option<Arc<dyn RemoteStore>> {
        if self.is_online() { self.remote() } else { None }
    }

    pub fn connectivity(&self) -> Connectivity {
        *self.connectivity.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity().is_online()
    }

    /// Record a connectivity observation, reporting whether it flipped.
    pub fn set_connectivity(&self, next: Connectivity) -> Transition {
        let mut transition = Transition::Unchanged;
        self.connectivity.send_if_modified(|current| {
            transition = current.transition(next);
            *current = next;
            transition != Transition::Unchanged
        });
        transition
    }

    /// Subscribe to connectivity updates.
    pub fn connectivity_watcher(&self) -> watch::Receiver<Connectivity> {
        self.connectivity.subscribe()
    }

    /// Broadcast hub used for the presentation event stream.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Run `f` against the board under a read lock.
    pub async fn read_board<R>(&self, f: impl FnOnce(&Board) -> R) -> R {
        let guard = self.board.read().await;
        f(&guard)
    }

    /// Run `f` against the board under the write lock.
    pub async fn with_board_mut<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let mut guard = self.board.write().await;
        f(&mut guard)
    }

    /// Write the current board to the local slot, logging failures.
    ///
    /// Saves are serialised and each one snapshots the board after acquiring
    /// the gate, so the last write always carries the latest state.
    pub async fn persist(&self) {
        let _gate = self.persist_gate.lock().await;
        let snapshot = self.read_board(Board::snapshot).await;
        if let Err(err) = self.snapshots.save(snapshot).await {
            warn!(error = %err, "failed to persist local snapshot");
        }
    }
}
