use axum::Router;

use crate::state::SharedState;

pub mod health;
pub mod players;
pub mod sse;
pub mod sync;
pub mod timer;

/// Compose all route trees, wiring in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(players::router())
        .merge(sync::router())
        .merge(timer::router())
        .with_state(state)
}
