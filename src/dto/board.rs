use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    dao::models::{Player, PlayerId},
    services::player_service::Outcome,
    state::{Board, Transition},
};

/// Largest single score adjustment accepted over the API.
pub const MAX_SCORE_DELTA: i64 = 10_000;
/// Most negative single score adjustment accepted over the API.
pub const MIN_SCORE_DELTA: i64 = -MAX_SCORE_DELTA;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
/// Player as shown by the presentation layer, with its derived leader flag.
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_leader: bool,
}

impl PlayerView {
    /// Project a player, flagging it when it holds `top_score`.
    pub fn new(player: &Player, top_score: Option<u32>) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            score: player.score,
            is_leader: top_score == Some(player.score),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// Aggregate figures; the average is pre-formatted with one decimal.
pub struct BoardStatsView {
    pub total_players: usize,
    pub total_score: u64,
    pub average_score: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// Full render model of the scoreboard.
pub struct BoardView {
    /// Players in board order.
    pub players: Vec<PlayerView>,
    /// Players ranked by score.
    pub standings: Vec<PlayerView>,
    /// Names of everyone tied for first place.
    pub leaders: Vec<String>,
    pub stats: BoardStatsView,
    pub elapsed_seconds: u64,
    /// Number of actions that can still be undone.
    pub undo_depth: usize,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        let top = board.top_score();
        let stats = board.stats();
        Self {
            players: board
                .players()
                .iter()
                .map(|player| PlayerView::new(player, top))
                .collect(),
            standings: board
                .standings()
                .into_iter()
                .map(|player| PlayerView::new(player, top))
                .collect(),
            leaders: board.leaders().into_iter().map(|p| p.name.clone()).collect(),
            stats: BoardStatsView {
                total_players: stats.total_players,
                total_score: stats.total_score,
                average_score: format!("{:.1}", stats.average_score),
            },
            elapsed_seconds: board.elapsed_seconds(),
            undo_depth: board.history().len(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// Payload to add a contestant.
pub struct AddPlayerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload to move a player's score by a signed amount.
pub struct ScoreChangeRequest {
    #[validate(range(min = MIN_SCORE_DELTA, max = MAX_SCORE_DELTA))]
    pub delta: i64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
/// Payload to zero every score; `confirm` must be true.
pub struct ResetScoresRequest {
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
/// Result of a player mutation.
pub struct MutationResponse {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerView>,
}

#[derive(Debug, Serialize)]
/// Result of an undo request.
pub struct UndoResponse {
    /// Kind of the action that was reverted.
    pub undone: &'static str,
    pub board: BoardView,
}

#[derive(Debug, Deserialize)]
/// Connectivity observation pushed by the presentation layer.
pub struct ConnectivityRequest {
    pub online: bool,
}

#[derive(Debug, Serialize)]
/// Connectivity after applying an observation.
pub struct ConnectivityResponse {
    pub online: bool,
    pub transition: Transition,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Elapsed challenge time reported by the presentation layer.
pub struct TimerRequest {
    #[validate(range(max = 31_536_000))]
    pub elapsed_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn board() -> Board {
        let mut board = Board::new();
        for (id, name, score) in [(1, "bob", 4), (2, "Alice", 4), (3, "Cara", 1)] {
            let mut player = Player::local(PlayerId(id), name, OffsetDateTime::UNIX_EPOCH);
            player.score = score;
            board.add_player(player).unwrap();
        }
        board
    }

    #[test]
    fn view_derives_leaders_standings_and_stats() {
        let view = BoardView::from(&board());
        let leaders: Vec<bool> = view.players.iter().map(|p| p.is_leader).collect();
        assert_eq!(leaders, [true, true, false]);
        let order: Vec<&str> = view.standings.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, ["Alice", "bob", "Cara"]);
        assert_eq!(view.leaders, ["bob", "Alice"]);
        assert_eq!(view.stats.total_score, 9);
        assert_eq!(view.stats.average_score, "3.0");
        assert_eq!(view.undo_depth, 3);
    }

    #[test]
    fn empty_board_average_is_zero() {
        let view = BoardView::from(&Board::new());
        assert_eq!(view.stats.average_score, "0.0");
        assert!(view.leaders.is_empty());
    }

    #[test]
    fn view_serialises_camel_case() {
        let value = serde_json::to_value(BoardView::from(&board())).unwrap();
        assert_eq!(value["players"][0]["isLeader"], true);
        assert_eq!(value["stats"]["averageScore"], "3.0");
        assert!(value.get("elapsedSeconds").is_some());
    }

    #[test]
    fn oversized_delta_fails_validation() {
        assert!(ScoreChangeRequest { delta: 1 }.validate().is_ok());
        assert!(ScoreChangeRequest { delta: -1 }.validate().is_ok());
        assert!(ScoreChangeRequest { delta: MAX_SCORE_DELTA }.validate().is_ok());
        assert!(ScoreChangeRequest { delta: MIN_SCORE_DELTA }.validate().is_ok());
        assert!(ScoreChangeRequest { delta: MAX_SCORE_DELTA + 1 }.validate().is_err());
        assert!(ScoreChangeRequest { delta: MIN_SCORE_DELTA - 1 }.validate().is_err());
    }
}
