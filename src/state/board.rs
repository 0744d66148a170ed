use std::{cmp::Ordering, collections::HashSet};

use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::{ActionRecord, LocalSnapshot, Player, PlayerId, PriorScore};

use super::history::ActionHistory;

/// Rejection raised when an insert would break board uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("player `{0}` already exists")]
    DuplicateName(String),
    #[error("player id {0} already exists")]
    DuplicateId(PlayerId),
}

/// Score movement applied by [`Board::set_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreMove {
    pub old_score: u32,
    pub new_score: u32,
}

/// Aggregate figures shown beside the standings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardStats {
    pub total_players: usize,
    pub total_score: u64,
    pub average_score: f64,
}

/// Apply a signed delta to a score, flooring at zero.
pub fn apply_delta(score: u32, delta: i64) -> u32 {
    let next = i64::from(score).saturating_add(delta);
    u32::try_from(next.clamp(0, i64::from(u32::MAX))).unwrap_or(u32::MAX)
}

/// Authoritative in-memory scoreboard: ordered players, undo log and elapsed time.
///
/// Mutations that users can undo push their inverse onto the history; remote
/// reconciliation through [`Board::replace_players`] never does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    players: Vec<Player>,
    history: ActionHistory,
    elapsed_seconds: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a board from a persisted snapshot, dropping rows that repeat an id.
    pub fn from_snapshot(snapshot: LocalSnapshot) -> Self {
        Self {
            players: dedupe_ids(snapshot.players),
            history: ActionHistory::from_records(snapshot.action_history),
            elapsed_seconds: snapshot.elapsed_seconds,
        }
    }

    /// Copy of everything that goes to the local slot.
    pub fn snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            players: self.players.clone(),
            action_history: self.history.iter().cloned().collect(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }

    /// Players in board order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn set_elapsed_seconds(&mut self, seconds: u64) {
        self.elapsed_seconds = seconds;
    }

    /// Whether a player with this name exists, ignoring case and surrounding whitespace.
    pub fn contains_name(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.players
            .iter()
            .any(|player| player.name.trim().to_lowercase() == wanted)
    }

    /// Identifier for a player created without the remote store.
    ///
    /// Uses the clock in milliseconds, bumped past the highest known id so two
    /// additions within the same millisecond still get distinct ids.
    pub fn next_local_id(&self, now_ms: u64) -> PlayerId {
        let highest = self.players.iter().map(|player| player.id.0).max();
        match highest {
            Some(max) if now_ms <= max => PlayerId(max.saturating_add(1)),
            _ => PlayerId(now_ms),
        }
    }

    /// Append a player and record the insertion.
    pub fn add_player(&mut self, player: Player) -> Result<(), BoardError> {
        if self.player(player.id).is_some() {
            return Err(BoardError::DuplicateId(player.id));
        }
        if self.contains_name(&player.name) {
            return Err(BoardError::DuplicateName(player.name));
        }
        self.history.push(ActionRecord::AddPlayer {
            player: player.clone(),
        });
        self.players.push(player);
        Ok(())
    }

    /// Set a player's score and record the previous value. Unknown ids are a no-op.
    pub fn set_score(&mut self, id: PlayerId, score: u32, now: OffsetDateTime) -> Option<ScoreMove> {
        let player = self.players.iter_mut().find(|player| player.id == id)?;
        let old_score = player.score;
        player.score = score;
        player.last_updated = Some(now);
        self.history.push(ActionRecord::ScoreChange {
            player_id: id,
            old_score,
            new_score: score,
        });
        Some(ScoreMove {
            old_score,
            new_score: score,
        })
    }

    /// Remove a player, recording its position so undo can put it back.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<(usize, Player)> {
        let index = self.players.iter().position(|player| player.id == id)?;
        let player = self.players.remove(index);
        self.history.push(ActionRecord::RemovePlayer {
            player: player.clone(),
            index,
        });
        Some((index, player))
    }

    /// Zero every score, recording what each player held.
    pub fn reset_scores(&mut self, now: OffsetDateTime) -> Vec<PriorScore> {
        let old_scores: Vec<PriorScore> = self
            .players
            .iter()
            .map(|player| PriorScore {
                id: player.id,
                score: player.score,
            })
            .collect();
        for player in &mut self.players {
            player.score = 0;
            player.last_updated = Some(now);
        }
        self.history.push(ActionRecord::ResetScores {
            old_scores: old_scores.clone(),
        });
        old_scores
    }

    /// Pop the latest record and apply its inverse.
    ///
    /// Parts of the inverse that refer to players no longer on the board are skipped.
    pub fn undo(&mut self) -> Option<ActionRecord> {
        let record = self.history.pop_last()?;
        match &record {
            ActionRecord::AddPlayer { player } => {
                self.players.retain(|existing| existing.id != player.id);
            }
            ActionRecord::RemovePlayer { player, index } => {
                if self.player(player.id).is_none() {
                    let at = (*index).min(self.players.len());
                    self.players.insert(at, player.clone());
                }
            }
            ActionRecord::ScoreChange {
                player_id,
                old_score,
                ..
            } => {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == *player_id) {
                    player.score = *old_score;
                }
            }
            ActionRecord::ResetScores { old_scores } => {
                for prior in old_scores {
                    if let Some(player) = self.players.iter_mut().find(|p| p.id == prior.id) {
                        player.score = prior.score;
                    }
                }
            }
        }
        Some(record)
    }

    /// Replace the player list with the remote one when it differs.
    ///
    /// Returns whether anything changed. The undo log is left alone.
    pub fn replace_players(&mut self, players: Vec<Player>) -> bool {
        let players = dedupe_ids(players);
        let unchanged = players.len() == self.players.len()
            && players
                .iter()
                .zip(&self.players)
                .all(|(remote, local)| remote.same_standing(local));
        if unchanged {
            return false;
        }
        self.players = players;
        true
    }

    /// Highest score on the board, if anyone has scored at all.
    pub fn top_score(&self) -> Option<u32> {
        self.players
            .iter()
            .map(|player| player.score)
            .max()
            .filter(|score| *score > 0)
    }

    /// Whether this player holds the top score. Nobody leads at zero.
    pub fn is_leading(&self, id: PlayerId) -> bool {
        match (self.top_score(), self.player(id)) {
            (Some(top), Some(player)) => player.score == top,
            _ => false,
        }
    }

    /// Every player tied for the top score, in board order.
    pub fn leaders(&self) -> Vec<&Player> {
        match self.top_score() {
            Some(top) => self.players.iter().filter(|p| p.score == top).collect(),
            None => Vec::new(),
        }
    }

    /// Players by descending score, ties broken by name ignoring case.
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| match b.score.cmp(&a.score) {
            Ordering::Equal => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            other => other,
        });
        ranked
    }

    pub fn stats(&self) -> BoardStats {
        let total_players = self.players.len();
        let total_score: u64 = self.players.iter().map(|p| u64::from(p.score)).sum();
        let average_score = if total_players == 0 {
            0.0
        } else {
            total_score as f64 / total_players as f64
        };
        BoardStats {
            total_players,
            total_score,
            average_score,
        }
    }
}

fn dedupe_ids(players: Vec<Player>) -> Vec<Player> {
    let mut seen = HashSet::new();
    players
        .into_iter()
        .filter(|player| seen.insert(player.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::history::HISTORY_CAPACITY;

    fn now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }

    fn player(id: u64, name: &str, score: u32) -> Player {
        Player {
            score,
            ..Player::local(PlayerId(id), name, now())
        }
    }

    fn board_with(players: &[(u64, &str, u32)]) -> Board {
        Board::from_snapshot(LocalSnapshot {
            players: players
                .iter()
                .map(|(id, name, score)| player(*id, name, *score))
                .collect(),
            ..LocalSnapshot::default()
        })
    }

    #[test]
    fn delta_never_drops_below_zero() {
        assert_eq!(apply_delta(0, -1), 0);
        assert_eq!(apply_delta(3, -5), 0);
        assert_eq!(apply_delta(3, 2), 5);
        assert_eq!(apply_delta(u32::MAX, 1), u32::MAX);
        assert_eq!(apply_delta(1, i64::MIN), 0);
    }

    #[test]
    fn names_are_unique_ignoring_case() {
        let mut board = board_with(&[(1, "Alice", 0)]);
        let err = board.add_player(player(2, "  alice ", 0)).unwrap_err();
        assert_eq!(err, BoardError::DuplicateName("  alice ".into()));
        assert_eq!(board.players().len(), 1);
        assert!(board.history().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut board = board_with(&[(1, "Alice", 0)]);
        assert_eq!(
            board.add_player(player(1, "Bob", 0)),
            Err(BoardError::DuplicateId(PlayerId(1)))
        );
    }

    #[test]
    fn local_ids_never_collide() {
        let board = board_with(&[(500, "Alice", 0)]);
        assert_eq!(board.next_local_id(1_000), PlayerId(1_000));
        assert_eq!(board.next_local_id(500), PlayerId(501));
        assert_eq!(board.next_local_id(10), PlayerId(501));
        assert_eq!(Board::new().next_local_id(42), PlayerId(42));
    }

    #[test]
    fn undo_add_removes_player() {
        let mut board = Board::new();
        board.add_player(player(1, "Alice", 0)).unwrap();
        let before = board_with(&[]);

        let undone = board.undo().unwrap();
        assert_eq!(undone.kind(), "add_player");
        assert_eq!(board.players(), before.players());
    }

    #[test]
    fn undo_remove_restores_position() {
        let mut board = board_with(&[(1, "Alice", 1), (2, "Bob", 2), (3, "Cara", 3)]);
        let before = board.players().to_vec();

        let (index, removed) = board.remove_player(PlayerId(2)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.name, "Bob");

        board.undo().unwrap();
        assert_eq!(board.players(), before.as_slice());
    }

    #[test]
    fn undo_remove_clamps_index_when_board_shrank() {
        let mut board = board_with(&[(1, "Alice", 1), (2, "Bob", 2), (3, "Cara", 3)]);
        board.remove_player(PlayerId(3)).unwrap();
        board.replace_players(vec![player(1, "Alice", 1)]);

        board.undo().unwrap();
        let names: Vec<&str> = board.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Cara"]);
    }

    #[test]
    fn undo_score_change_restores_old_score() {
        let mut board = board_with(&[(1, "Alice", 4)]);
        let moved = board.set_score(PlayerId(1), 5, now()).unwrap();
        assert_eq!(moved, ScoreMove { old_score: 4, new_score: 5 });

        board.undo().unwrap();
        assert_eq!(board.player(PlayerId(1)).unwrap().score, 4);
    }

    #[test]
    fn set_score_on_unknown_player_is_noop() {
        let mut board = board_with(&[(1, "Alice", 4)]);
        assert!(board.set_score(PlayerId(9), 5, now()).is_none());
        assert!(board.history().is_empty());
    }

    #[test]
    fn undo_reset_restores_every_score() {
        let mut board = board_with(&[(1, "Alice", 4), (2, "Bob", 7)]);
        let prior = board.reset_scores(now());
        assert_eq!(prior.len(), 2);
        assert!(board.players().iter().all(|p| p.score == 0));

        board.undo().unwrap();
        assert_eq!(board.player(PlayerId(1)).unwrap().score, 4);
        assert_eq!(board.player(PlayerId(2)).unwrap().score, 7);
    }

    #[test]
    fn undo_skips_players_that_vanished() {
        let mut board = board_with(&[(1, "Alice", 4), (2, "Bob", 7)]);
        board.reset_scores(now());
        board.replace_players(vec![player(2, "Bob", 0)]);

        board.undo().unwrap();
        assert_eq!(board.players().len(), 1);
        assert_eq!(board.player(PlayerId(2)).unwrap().score, 7);
    }

    #[test]
    fn undo_on_empty_history_returns_none() {
        let mut board = board_with(&[(1, "Alice", 4)]);
        assert!(board.undo().is_none());
        assert_eq!(board.player(PlayerId(1)).unwrap().score, 4);
    }

    #[test]
    fn only_ten_actions_are_undoable() {
        let mut board = board_with(&[(1, "Alice", 0)]);
        for score in 1..=12 {
            board.set_score(PlayerId(1), score, now());
        }
        assert_eq!(board.history().len(), HISTORY_CAPACITY);

        while board.undo().is_some() {}
        assert_eq!(board.player(PlayerId(1)).unwrap().score, 2);
    }

    #[test]
    fn leaders_require_a_positive_top_score() {
        let board = board_with(&[(1, "Alice", 0), (2, "Bob", 0)]);
        assert!(board.leaders().is_empty());
        assert!(!board.is_leading(PlayerId(1)));

        let board = board_with(&[(1, "Alice", 5), (2, "Bob", 5), (3, "Cara", 2)]);
        let leaders: Vec<&str> = board.leaders().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(leaders, ["Alice", "Bob"]);
        assert!(board.is_leading(PlayerId(2)));
        assert!(!board.is_leading(PlayerId(3)));
    }

    #[test]
    fn standings_sort_by_score_then_name() {
        let board = board_with(&[(1, "bob", 3), (2, "Alice", 3), (3, "Cara", 9), (4, "dan", 0)]);
        let order: Vec<&str> = board.standings().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, ["Cara", "Alice", "bob", "dan"]);
    }

    #[test]
    fn stats_handle_empty_board() {
        let stats = Board::new().stats();
        assert_eq!(stats.total_players, 0);
        assert_eq!(stats.total_score, 0);
        assert_eq!(stats.average_score, 0.0);

        let stats = board_with(&[(1, "Alice", 3), (2, "Bob", 4)]).stats();
        assert_eq!(stats.total_score, 7);
        assert_eq!(stats.average_score, 3.5);
    }

    #[test]
    fn replace_players_detects_equality_and_keeps_history() {
        let mut board = board_with(&[(1, "Alice", 3)]);
        board.set_score(PlayerId(1), 4, now());

        let mut same = player(1, "Alice", 4);
        same.created = None;
        assert!(!board.replace_players(vec![same]));

        assert!(board.replace_players(vec![player(1, "Alice", 10), player(1, "Dup", 0)]));
        assert_eq!(board.players().len(), 1);
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_board() {
        let mut board = board_with(&[(1, "Alice", 3)]);
        board.set_score(PlayerId(1), 4, now());
        board.set_elapsed_seconds(61);

        let restored = Board::from_snapshot(board.snapshot());
        assert_eq!(restored, board);
    }
}
