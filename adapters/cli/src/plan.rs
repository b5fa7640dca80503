//! Session plans read from TOML.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use training_defence_core::{GridCoord, MapId, TowerKind};

/// Scripted session: which map to play, how to build and how long to run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionPlan {
    /// Map to play; switching starts a fresh run.
    #[serde(default)]
    pub(crate) map: MapId,
    /// Whether waves are generated from today's daily seed.
    #[serde(default)]
    pub(crate) daily: bool,
    /// Number of waves to play before stopping.
    #[serde(default = "default_waves")]
    pub(crate) waves: u32,
    /// Save slot to use, the stored active slot when absent.
    #[serde(default)]
    pub(crate) slot: Option<u8>,
    /// Towers built before the first wave, in order.
    #[serde(default)]
    pub(crate) towers: Vec<PlannedTower>,
}

fn default_waves() -> u32 {
    1
}

/// Level-1 tower built before the first wave.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlannedTower {
    /// Kind of tower to build.
    pub(crate) kind: TowerKind,
    /// Column of the tile.
    pub(crate) column: u32,
    /// Row of the tile.
    pub(crate) row: u32,
}

impl PlannedTower {
    /// Tile the tower occupies.
    pub(crate) fn cell(&self) -> GridCoord {
        GridCoord::new(self.column, self.row)
    }
}

impl SessionPlan {
    /// Parses a plan from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("session plan is not valid TOML")
    }

    /// Reads and parses a plan file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read session plan {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_plan_parses() {
        let plan = SessionPlan::parse(
            r#"
            map = "core"
            daily = true
            waves = 3
            slot = 2

            [[towers]]
            kind = "pulse"
            column = 2
            row = 2

            [[towers]]
            kind = "snare"
            column = 3
            row = 4
            "#,
        )
        .expect("plan parses");

        assert_eq!(plan.map, MapId::Core);
        assert!(plan.daily);
        assert_eq!(plan.waves, 3);
        assert_eq!(plan.slot, Some(2));
        assert_eq!(plan.towers.len(), 2);
        assert_eq!(plan.towers[0].kind, TowerKind::Pulse);
        assert_eq!(plan.towers[1].cell(), GridCoord::new(3, 4));
    }

    #[test]
    fn empty_plan_plays_one_wave_on_the_default_map() {
        let plan = SessionPlan::parse("").expect("plan parses");
        assert_eq!(plan.map, MapId::Core);
        assert_eq!(plan.waves, 1);
        assert!(plan.towers.is_empty());
    }

    #[test]
    fn bundled_demo_plan_parses() {
        let plan = SessionPlan::parse(include_str!("../../../demos/opening.toml"))
            .expect("demo plan parses");
        assert_eq!(plan.waves, 3);
        assert_eq!(plan.towers.len(), 2);
    }

    #[test]
    fn unknown_keys_are_reported() {
        assert!(SessionPlan::parse("wave = 3").is_err());
        assert!(SessionPlan::parse("[[towers]]\nkind = \"laser\"\ncolumn = 1\nrow = 1").is_err());
        assert!(SessionPlan::parse("[[towers]]\nkind = \"pulse\"\ncolumn = 1\nrow = 1\nlevel = 3").is_err());
    }
}
