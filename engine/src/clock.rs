//! Time sources: the fixed-step accumulator and the calendar.

use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use training_defence_core::{LOGIC_STEP, MAX_FRAME_DELTA};

/// Converts variable frame deltas into whole logic steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedStep {
    accumulator: Duration,
}

impl FixedStep {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accumulator: Duration::ZERO,
        }
    }

    /// Adds a frame delta and returns how many logic steps are now due.
    ///
    /// Each frame contributes at most [`MAX_FRAME_DELTA`], so resuming after a
    /// long stall never produces a burst of catch-up steps.
    pub fn push(&mut self, frame_delta: Duration) -> u32 {
        self.accumulator += frame_delta.min(MAX_FRAME_DELTA);
        let mut steps = 0;
        while self.accumulator >= LOGIC_STEP {
            self.accumulator -= LOGIC_STEP;
            steps += 1;
        }
        steps
    }

    /// Time carried over into the next frame.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Drops any carried-over time.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

/// Supplies the calendar day and wall-clock timestamps.
pub trait Calendar {
    /// Current calendar day, used for daily seeds and streaks.
    fn today(&self) -> NaiveDate;

    /// Current Unix time in milliseconds.
    fn now_millis(&self) -> i64;
}

/// Calendar backed by the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemCalendar;

impl Calendar for SystemCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Calendar frozen at a chosen instant, advanced manually.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCalendar {
    day: NaiveDate,
    millis: i64,
}

impl FixedCalendar {
    /// Creates a calendar frozen at the start of `day`.
    #[must_use]
    pub fn new(day: NaiveDate) -> Self {
        let millis = day
            .and_hms_opt(0, 0, 0)
            .map_or(0, |midnight| midnight.and_utc().timestamp_millis());
        Self { day, millis }
    }

    /// Moves to the following day.
    pub fn next_day(&mut self) {
        if let Some(next) = self.day.succ_opt() {
            *self = Self::new(next);
        }
    }

    /// Advances the wall clock without changing the day.
    pub fn advance(&mut self, elapsed: Duration) {
        let elapsed = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        self.millis = self.millis.saturating_add(elapsed);
    }
}

impl Calendar for FixedCalendar {
    fn today(&self) -> NaiveDate {
        self.day
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}
