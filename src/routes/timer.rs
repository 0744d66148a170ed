use axum::{Json, Router, extract::State, http::StatusCode, routing::put};
use validator::Validate;

use crate::{
    dto::board::TimerRequest, error::AppError, services::player_service, state::SharedState,
};

/// Routes for the elapsed challenge time.
pub fn router() -> Router<SharedState> {
    Router::new().route("/timer", put(set_timer))
}

/// Persist the elapsed time shown by the presentation layer.
pub async fn set_timer(
    State(state): State<SharedState>,
    Json(payload): Json<TimerRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    player_service::set_elapsed_seconds(&state, payload.elapsed_seconds).await;
    Ok(StatusCode::NO_CONTENT)
}
