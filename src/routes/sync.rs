use axum::{
    Json, Router,
    extract::State,
    routing::{post, put},
};

use crate::{
    dto::board::{ConnectivityRequest, ConnectivityResponse},
    services::{
        connectivity_service,
        sync_service::{self, SyncOutcome},
    },
    state::SharedState,
};

/// Routes driving reconciliation and connectivity.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sync", post(sync))
        .route("/connectivity", put(set_connectivity))
}

/// Reconcile with the remote store right away.
pub async fn sync(State(state): State<SharedState>) -> Json<SyncOutcome> {
    Json(sync_service::sync_with_server(&state).await)
}

/// Feed a connectivity observation from the presentation layer.
pub async fn set_connectivity(
    State(state): State<SharedState>,
    Json(payload): Json<ConnectivityRequest>,
) -> Json<ConnectivityResponse> {
    let transition = connectivity_service::apply_connectivity(&state, payload.online).await;
    Json(ConnectivityResponse {
        online: state.is_online(),
        transition,
    })
}
