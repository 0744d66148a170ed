use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the last known remote reachability.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let response = HealthResponse::new(state.remote().is_some(), state.is_online());
    if response.status != "ok" {
        debug!(status = %response.status, "health check while offline");
    }
    response
}
