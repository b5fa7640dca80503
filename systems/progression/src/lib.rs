#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Long-lived progression that outlives a single run.
//!
//! The campaign gates maps behind stage targets, the leaderboards rank runs
//! and the daily record tracks per-day boards together with the completion
//! streak.

mod campaign;
mod daily;
mod leaderboard;

pub use campaign::{Campaign, CampaignProgress, CampaignStage, StageReward, CAMPAIGN_STAGES};
pub use daily::{seed_for, DailyOutcome, DailyRecord, DAILY_HISTORY};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
