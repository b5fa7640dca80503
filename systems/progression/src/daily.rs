use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use training_defence_core::STREAK_BONUS;

use crate::leaderboard::{Leaderboard, LeaderboardEntry};

/// Number of calendar days whose boards are retained.
pub const DAILY_HISTORY: usize = 14;

/// Seed string shared by every player on the provided day.
#[must_use]
pub fn seed_for(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Result of recording a completed daily run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyOutcome {
    /// Credits granted as streak bonus, zero after the first completion of a day.
    pub bonus: u32,
    /// Streak length after the completion.
    pub streak: u32,
    /// Whether the run holds a place on the day's board.
    pub ranked: bool,
}

/// Per-day leaderboards plus the completion streak.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    #[serde(default)]
    boards: BTreeMap<String, Leaderboard>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    last_completed: Option<NaiveDate>,
}

impl DailyRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current streak length.
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    /// Last day on which a daily run was completed.
    #[must_use]
    pub const fn last_completed(&self) -> Option<NaiveDate> {
        self.last_completed
    }

    /// Board of the provided seed, if any run was recorded for it.
    #[must_use]
    pub fn board(&self, seed: &str) -> Option<&Leaderboard> {
        self.boards.get(seed)
    }

    /// Records a run of the `seed` challenge completed on `day`.
    ///
    /// The streak bonus is paid only for the first completion of a calendar
    /// day. The streak continues when the previous completion was the day
    /// before and restarts at one otherwise.
    pub fn complete_run(
        &mut self,
        seed: &str,
        day: NaiveDate,
        entry: LeaderboardEntry,
    ) -> DailyOutcome {
        let ranked = self
            .boards
            .entry(seed.to_owned())
            .or_default()
            .record(entry);
        self.prune();

        if self.last_completed == Some(day) {
            return DailyOutcome {
                bonus: 0,
                streak: self.streak,
                ranked,
            };
        }

        let continues = self
            .last_completed
            .and_then(|last| last.succ_opt())
            .is_some_and(|next| next == day);
        self.streak = if continues { self.streak + 1 } else { 1 };
        self.last_completed = Some(day);
        info!(streak = self.streak, day = %day, "daily streak advanced");

        DailyOutcome {
            bonus: STREAK_BONUS,
            streak: self.streak,
            ranked,
        }
    }

    fn prune(&mut self) {
        while self.boards.len() > DAILY_HISTORY {
            let _ = self.boards.pop_first();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use training_defence_core::MapId;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn entry(run_id: u64, wave: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            run_id,
            wave,
            kills: wave * 8,
            time: f64::from(wave) * 30.0,
            map: MapId::Core,
            recorded_at: 0,
        }
    }

    #[test]
    fn bonus_is_paid_once_per_day() {
        let mut record = DailyRecord::new();
        let first = record.complete_run("2026-10-18", day("2026-10-18"), entry(1, 1));
        let second = record.complete_run("2026-10-18", day("2026-10-18"), entry(1, 2));
        let third = record.complete_run("2026-10-18", day("2026-10-18"), entry(2, 1));

        assert_eq!(first.bonus, STREAK_BONUS);
        assert_eq!(second.bonus, 0);
        assert_eq!(third.bonus, 0);
        assert_eq!(record.streak(), 1);
        assert_eq!(record.board("2026-10-18").map(Leaderboard::len), Some(2));
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut record = DailyRecord::new();
        let _ = record.complete_run("2026-10-16", day("2026-10-16"), entry(1, 1));
        let _ = record.complete_run("2026-10-17", day("2026-10-17"), entry(2, 1));
        let outcome = record.complete_run("2026-10-18", day("2026-10-18"), entry(3, 1));
        assert_eq!(outcome.streak, 3);
        assert_eq!(record.last_completed(), Some(day("2026-10-18")));
    }

    #[test]
    fn gaps_reset_the_streak() {
        let mut record = DailyRecord::new();
        let _ = record.complete_run("2026-10-14", day("2026-10-14"), entry(1, 1));
        let _ = record.complete_run("2026-10-15", day("2026-10-15"), entry(2, 1));
        let outcome = record.complete_run("2026-10-18", day("2026-10-18"), entry(3, 1));
        assert_eq!(outcome.streak, 1);
        assert_eq!(outcome.bonus, STREAK_BONUS);
    }

    #[test]
    fn old_boards_are_pruned() {
        let mut record = DailyRecord::new();
        let mut current = day("2026-09-01");
        for run in 0..30 {
            let _ = record.complete_run(&seed_for(current), current, entry(run, 1));
            current = current.succ_opt().expect("next day");
        }
        assert!(record.board("2026-09-01").is_none());
        assert!(record.board("2026-09-30").is_some());
    }

    #[test]
    fn persisted_form_round_trips() {
        let mut record = DailyRecord::new();
        let _ = record.complete_run("2026-10-18", day("2026-10-18"), entry(5, 3));
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains(r#""lastCompleted":"2026-10-18""#));
        let restored: DailyRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, record);
    }
}
