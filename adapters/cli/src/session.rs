//! Plays a [`SessionPlan`] against an engine.

use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};
use training_defence_core::LOGIC_STEP;
use training_defence_engine::{Calendar, Engine};
use training_defence_system_persistence::{KeyValueStore, SlotId};

use crate::plan::{PlannedTower, SessionPlan};

/// Logic steps a single wave may take before the session gives up on it.
const MAX_WAVE_STEPS: u32 = 30 * 60 * 10;

/// Outcome of one played wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WaveReport {
    pub(crate) wave: u32,
    pub(crate) cleared: bool,
    pub(crate) kills: u32,
    pub(crate) lives: u32,
    pub(crate) credits: u32,
    pub(crate) status: String,
}

impl fmt::Display for WaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.cleared { "cleared" } else { "lost" };
        write!(
            f,
            "wave {} {outcome} | {} kills | {} lives | {} credits | {}",
            self.wave, self.kills, self.lives, self.credits, self.status
        )
    }
}

/// Outcome of a whole session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionReport {
    pub(crate) waves: Vec<WaveReport>,
    pub(crate) slot: SlotId,
    pub(crate) saved: bool,
}

/// Starts a fresh run as described by `plan`, builds its towers, plays its
/// waves and saves the result into the plan's slot.
pub(crate) fn run<S, C>(engine: &mut Engine<S, C>, plan: &SessionPlan) -> Result<SessionReport>
where
    S: KeyValueStore,
    C: Calendar,
{
    if let Some(number) = plan.slot {
        let slot = SlotId::new(number).ok_or_else(|| anyhow!("slot {number} does not exist"))?;
        engine.set_active_slot(slot);
    }

    engine.reset();
    if plan.map != engine.map() {
        engine
            .set_map(plan.map)
            .with_context(|| format!("cannot switch to map {}", plan.map))?;
    }
    engine
        .set_daily_mode(plan.daily)
        .context("cannot change the seed mode")?;
    info!(map = %plan.map, daily = plan.daily, towers = plan.towers.len(), "session started");

    for tower in &plan.towers {
        build(engine, tower)?;
    }

    let mut waves = Vec::new();
    for _ in 0..plan.waves {
        if engine.is_game_over() {
            break;
        }
        engine.start_wave().context("cannot start the next wave")?;
        play_wave(engine)?;
        let report = WaveReport {
            wave: engine.wave(),
            cleared: !engine.is_game_over(),
            kills: engine.kills(),
            lives: engine.lives(),
            credits: engine.credits(),
            status: engine.status().to_owned(),
        };
        debug!(wave = report.wave, cleared = report.cleared, "wave played");
        waves.push(report);
    }

    let saved = engine.save();
    Ok(SessionReport {
        waves,
        slot: engine.active_slot(),
        saved,
    })
}

fn build<S, C>(engine: &mut Engine<S, C>, tower: &PlannedTower) -> Result<()>
where
    S: KeyValueStore,
    C: Calendar,
{
    engine.place_tower(tower.kind, tower.cell()).with_context(|| {
        format!(
            "cannot place {} at ({}, {})",
            tower.kind.as_str(),
            tower.column,
            tower.row
        )
    })
}

fn play_wave<S, C>(engine: &mut Engine<S, C>) -> Result<()>
where
    S: KeyValueStore,
    C: Calendar,
{
    for _ in 0..MAX_WAVE_STEPS {
        let _ = engine.advance(LOGIC_STEP);
        if !engine.is_wave_active() {
            return Ok(());
        }
    }
    bail!("wave {} did not finish", engine.wave())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use training_defence_core::{MapId, TowerKind};
    use training_defence_engine::FixedCalendar;
    use training_defence_system_persistence::MemoryStore;

    use super::*;

    fn engine() -> Engine<MemoryStore, FixedCalendar> {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
        Engine::new(MemoryStore::new(), FixedCalendar::new(day))
    }

    fn tower(kind: TowerKind, column: u32, row: u32) -> PlannedTower {
        PlannedTower { kind, column, row }
    }

    fn plan(towers: Vec<PlannedTower>) -> SessionPlan {
        SessionPlan {
            map: MapId::Core,
            daily: false,
            waves: 1,
            slot: Some(2),
            towers,
        }
    }

    #[test]
    fn planned_wave_is_played_and_saved() {
        let mut engine = engine();
        let plan = plan(vec![
            tower(TowerKind::Pulse, 2, 2),
            tower(TowerKind::Pulse, 3, 4),
        ]);

        let report = run(&mut engine, &plan).expect("session runs");
        assert_eq!(report.waves.len(), 1);
        assert_eq!(report.waves[0].wave, 1);
        assert!(report.waves[0].cleared);
        assert!(report.saved);
        assert_eq!(report.slot, SlotId::new(2).expect("slot 2"));
        assert!(engine
            .store()
            .get(&report.slot.key())
            .expect("readable")
            .is_some());
        assert_eq!(engine.leaderboard().len(), 1);
    }

    #[test]
    fn towers_are_built_without_playing_when_no_waves_are_planned() {
        let mut engine = engine();
        let mut plan = plan(vec![tower(TowerKind::Snare, 2, 2)]);
        plan.waves = 0;

        let report = run(&mut engine, &plan).expect("session runs");
        assert!(report.waves.is_empty());
        let built = engine.tower_view().into_vec();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].kind, TowerKind::Snare);
        assert_eq!(engine.wave(), 0);
    }

    #[test]
    fn invalid_plans_are_reported() {
        let mut engine = engine();

        let error = run(
            &mut engine,
            &plan(vec![tower(TowerKind::Arc, 2, 2), tower(TowerKind::Arc, 3, 4)]),
        )
        .expect_err("second arc unaffordable");
        assert!(format!("{error:#}").contains("120 credits required, 20 available"));

        let error = run(&mut engine, &plan(vec![tower(TowerKind::Pulse, 0, 3)]))
            .expect_err("path tile");
        assert!(error.to_string().contains("cannot place pulse"));

        let mut locked = plan(Vec::new());
        locked.map = MapId::Lattice;
        assert!(run(&mut engine, &locked).is_err());

        let mut missing_slot = plan(Vec::new());
        missing_slot.slot = Some(7);
        assert!(run(&mut engine, &missing_slot).is_err());
    }
}
