use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dao::models::PlayerId,
    dto::board::{
        AddPlayerRequest, BoardView, MutationResponse, PlayerView, ResetScoresRequest,
        ScoreChangeRequest, UndoResponse,
    },
    error::AppError,
    services::player_service::{self, Mutation, Outcome},
    state::SharedState,
};

/// Routes exposing the scoreboard and its mutations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(board).post(add_player))
        .route("/players/{id}", delete(remove_player))
        .route("/players/{id}/score", post(update_score))
        .route("/scores/reset", post(reset_scores))
        .route("/history/undo", post(undo))
}

/// Render the whole board.
pub async fn board(State(state): State<SharedState>) -> Json<BoardView> {
    Json(state.read_board(|board| BoardView::from(board)).await)
}

/// Add a contestant.
pub async fn add_player(
    State(state): State<SharedState>,
    Json(payload): Json<AddPlayerRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let mutation = player_service::add_player(&state, &payload.name).await?;
    Ok(Json(mutation_response(&state, mutation).await))
}

/// Move a player's score by a signed delta.
pub async fn update_score(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(payload): Json<ScoreChangeRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    payload.validate()?;
    let mutation = player_service::update_score(&state, PlayerId(id), payload.delta).await;
    Ok(Json(mutation_response(&state, mutation).await))
}

/// Remove a contestant.
pub async fn remove_player(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Json<MutationResponse> {
    let mutation = player_service::remove_player(&state, PlayerId(id)).await;
    let remaining_top = state.read_board(|board| board.top_score()).await;
    let player = mutation.player.as_ref().map(|player| {
        // Leadership as it stood before the removal.
        let top = remaining_top.max(Some(player.score).filter(|score| *score > 0));
        PlayerView::new(player, top)
    });
    Json(MutationResponse {
        outcome: mutation.outcome,
        player,
    })
}

/// Zero every score once the caller confirms.
pub async fn reset_scores(
    State(state): State<SharedState>,
    payload: Option<Json<ResetScoresRequest>>,
) -> Result<Json<BoardView>, AppError> {
    let confirm = payload.is_some_and(|Json(request)| request.confirm);
    player_service::reset_scores(&state, confirm).await?;
    Ok(board(State(state)).await)
}

/// Revert the latest action.
pub async fn undo(State(state): State<SharedState>) -> Result<Json<UndoResponse>, AppError> {
    let record = player_service::undo_last_action(&state).await?;
    let board = state.read_board(|board| BoardView::from(board)).await;
    Ok(Json(UndoResponse {
        undone: record.kind(),
        board,
    }))
}

async fn mutation_response(state: &SharedState, mutation: Mutation) -> MutationResponse {
    let player = match (&mutation.player, mutation.outcome) {
        (Some(player), Outcome::Synced | Outcome::LocalOnly) => {
            let id = player.id;
            state
                .read_board(|board| {
                    let top = board.top_score();
                    board.player(id).map(|current| PlayerView::new(current, top))
                })
                .await
        }
        _ => None,
    };
    MutationResponse {
        outcome: mutation.outcome,
        player,
    }
}
