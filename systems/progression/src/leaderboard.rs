use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use training_defence_core::{MapId, LEADERBOARD_CAPACITY};

/// One ranked run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Run that owns the entry.
    pub run_id: u64,
    /// Highest cleared wave.
    pub wave: u32,
    /// Enemies killed during the run.
    pub kills: u32,
    /// Simulated seconds the run took.
    pub time: f64,
    /// Map the run was played on.
    #[serde(default)]
    pub map: MapId,
    /// Unix milliseconds of the last update.
    #[serde(default)]
    pub recorded_at: i64,
}

impl LeaderboardEntry {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .wave
            .cmp(&self.wave)
            .then(other.kills.cmp(&self.kills))
            .then(self.time.total_cmp(&other.time))
    }
}

/// Top runs ordered by wave, then kills, then fastest time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry of the run and re-ranks the board.
    ///
    /// Returns whether the run holds a place after truncation.
    pub fn record(&mut self, entry: LeaderboardEntry) -> bool {
        let run_id = entry.run_id;
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.run_id == run_id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.entries.sort_by(LeaderboardEntry::rank);
        self.entries.truncate(LEADERBOARD_CAPACITY);
        self.entries.iter().any(|existing| existing.run_id == run_id)
    }

    /// Ranked entries, best first.
    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Number of ranked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no run has been ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(run_id: u64, wave: u32, kills: u32, time: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            run_id,
            wave,
            kills,
            time,
            map: MapId::Core,
            recorded_at: 0,
        }
    }

    #[test]
    fn ranks_by_wave_kills_then_time() {
        let mut board = Leaderboard::new();
        let _ = board.record(entry(1, 4, 30, 100.0));
        let _ = board.record(entry(2, 6, 10, 300.0));
        let _ = board.record(entry(3, 4, 30, 80.0));
        let _ = board.record(entry(4, 4, 41, 500.0));

        let order: Vec<u64> = board.entries().iter().map(|entry| entry.run_id).collect();
        assert_eq!(order, vec![2, 4, 3, 1]);
    }

    #[test]
    fn runs_own_a_single_entry() {
        let mut board = Leaderboard::new();
        assert!(board.record(entry(9, 1, 5, 20.0)));
        assert!(board.record(entry(9, 2, 12, 45.0)));
        assert_eq!(board.len(), 1);
        assert_eq!(board.entries()[0].wave, 2);
    }

    #[test]
    fn capacity_drops_the_weakest_runs() {
        let mut board = Leaderboard::new();
        for run in 0..LEADERBOARD_CAPACITY as u64 {
            assert!(board.record(entry(run, 5 + run as u32, 0, 1.0)));
        }
        assert!(!board.record(entry(99, 1, 0, 1.0)));
        assert!(board.record(entry(100, 50, 0, 1.0)));
        assert_eq!(board.len(), LEADERBOARD_CAPACITY);
        assert_eq!(board.entries()[0].run_id, 100);
        assert!(board.entries().iter().all(|entry| entry.run_id != 0));
    }

    #[test]
    fn persisted_form_is_a_plain_array() {
        let mut board = Leaderboard::new();
        let _ = board.record(entry(3, 2, 7, 12.5));
        let json = serde_json::to_string(&board).expect("serialize");
        assert!(json.starts_with("[{"));
        assert!(json.contains(r#""runId":3"#));
        let restored: Leaderboard = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, board);
    }
}
