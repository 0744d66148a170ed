use std::collections::VecDeque;

use crate::dao::models::ActionRecord;

/// Number of mutations kept for undo.
pub const HISTORY_CAPACITY: usize = 10;

/// Bounded undo log. Pushing past capacity evicts the oldest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHistory {
    records: VecDeque<ActionRecord>,
    capacity: usize,
}

impl ActionHistory {
    /// Empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Empty log holding at most `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from persisted records, oldest first, keeping only the newest ones.
    pub fn from_records(records: impl IntoIterator<Item = ActionRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            history.push(record);
        }
        history
    }

    /// Append a record, returning the evicted oldest one when the log was full.
    pub fn push(&mut self, record: ActionRecord) -> Option<ActionRecord> {
        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Remove and return the most recent record.
    pub fn pop_last(&mut self) -> Option<ActionRecord> {
        self.records.pop_back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::PlayerId;

    fn score_change(n: u32) -> ActionRecord {
        ActionRecord::ScoreChange {
            player_id: PlayerId(1),
            old_score: n,
            new_score: n + 1,
        }
    }

    #[test]
    fn eleventh_push_evicts_oldest() {
        let mut history = ActionHistory::new();
        for n in 0..10 {
            assert!(history.push(score_change(n)).is_none());
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        let evicted = history.push(score_change(10));
        assert_eq!(evicted, Some(score_change(0)));
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next(), Some(&score_change(1)));
    }

    #[test]
    fn pop_last_is_lifo() {
        let mut history = ActionHistory::new();
        history.push(score_change(1));
        history.push(score_change(2));

        assert_eq!(history.pop_last(), Some(score_change(2)));
        assert_eq!(history.pop_last(), Some(score_change(1)));
        assert_eq!(history.pop_last(), None);
        assert!(history.is_empty());
    }

    #[test]
    fn oversized_persisted_log_keeps_newest() {
        let history = ActionHistory::from_records((0..15).map(score_change));
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next(), Some(&score_change(5)));
    }
}
