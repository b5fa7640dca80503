//! Versioned persisted snapshot schema.
//!
//! Every field added after version 1 carries a serde default so that older
//! payloads deserialize into the current shape.

use serde::{Deserialize, Serialize};

use crate::{BranchId, EnemyKind, MapId, TowerKind, STARTING_CREDITS, STARTING_LIVES};

/// Version written by the current build.
pub const SNAPSHOT_VERSION: u32 = 3;
/// Versions accepted on load.
pub const SUPPORTED_VERSIONS: [u32; 3] = [1, 2, 3];

/// Reports whether snapshots tagged with `version` can be loaded.
#[must_use]
pub fn is_supported_version(version: u32) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

fn default_money() -> u32 {
    STARTING_CREDITS
}

fn default_lives() -> u32 {
    STARTING_LIVES
}

fn default_level() -> u8 {
    1
}

fn default_path_index() -> usize {
    1
}

fn default_slow_factor() -> f32 {
    1.0
}

/// Full persisted state of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Schema version tag.
    pub version: u32,
    /// Credits held.
    #[serde(default = "default_money")]
    pub money: u32,
    /// Lives left.
    #[serde(default = "default_lives")]
    pub lives: u32,
    /// Wave counter.
    #[serde(default)]
    pub wave: u32,
    /// Active map; absent before version 2.
    #[serde(default)]
    pub map_id: MapId,
    /// Enemies killed during the run.
    #[serde(default)]
    pub kills: u32,
    /// Unix timestamp of the save in milliseconds.
    #[serde(default)]
    pub saved_at: i64,
    /// Identifier of the run, stable across saves.
    #[serde(default)]
    pub run_id: u64,
    /// Simulated seconds spent inside waves.
    #[serde(default)]
    pub run_time: f64,
    /// Daily seed the run is playing, if in daily mode.
    #[serde(default)]
    pub daily_seed: Option<String>,
    /// Placed towers.
    #[serde(default)]
    pub towers: Vec<TowerRecord>,
    /// Live enemies.
    #[serde(default)]
    pub enemies: Vec<EnemyRecord>,
    /// Whether a wave is running.
    #[serde(default)]
    pub wave_active: bool,
    /// Spawner of the running wave.
    #[serde(default)]
    pub spawner: Option<SpawnerRecord>,
    /// Whether logic advance is paused.
    #[serde(default)]
    pub paused: bool,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            money: STARTING_CREDITS,
            lives: STARTING_LIVES,
            wave: 0,
            map_id: MapId::default(),
            kills: 0,
            saved_at: 0,
            run_id: 0,
            run_time: 0.0,
            daily_seed: None,
            towers: Vec::new(),
            enemies: Vec::new(),
            wave_active: false,
            spawner: None,
            paused: false,
        }
    }
}

/// Persisted tower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerRecord {
    /// Tower kind.
    #[serde(rename = "type")]
    pub kind: TowerKind,
    /// Column of the occupied tile.
    pub grid_x: u32,
    /// Row of the occupied tile.
    pub grid_y: u32,
    /// Level, 1 through 3.
    #[serde(default = "default_level")]
    pub level: u8,
    /// Seconds until the next shot.
    #[serde(default)]
    pub cooldown: f32,
    /// Chosen branch; absent before version 3.
    #[serde(default)]
    pub path: Option<BranchId>,
}

/// Persisted enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyRecord {
    /// Enemy kind.
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Remaining hit points.
    pub hp: f32,
    /// Hit points at spawn; defaults to the kind's table value.
    #[serde(default)]
    pub max_hp: Option<f32>,
    /// Index of the next waypoint.
    #[serde(default = "default_path_index")]
    pub path_index: usize,
    /// Seconds of slow left.
    #[serde(default)]
    pub slow_timer: f32,
    /// Movement multiplier while slowed.
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f32,
    /// Seconds of burn left.
    #[serde(default)]
    pub burn_timer: f32,
    /// Burn damage per second.
    #[serde(default)]
    pub burn_dps: f32,
    /// Seconds of stun left.
    #[serde(default)]
    pub stun_timer: f32,
    /// Seconds the raised shield stays up.
    #[serde(default)]
    pub shield_timer: f32,
    /// Whether the shield is about to rise.
    #[serde(default)]
    pub shield_warn: bool,
    /// Seconds until the next shield; defaults to the kind's interval.
    #[serde(default, alias = "bossShieldTimer")]
    pub shield_recharge: Option<f32>,
    /// Seconds until the next minion; defaults to the kind's interval.
    #[serde(default)]
    pub boss_spawn_timer: Option<f32>,
}

/// Persisted spawner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnerRecord {
    /// Ordered backlog of the wave.
    #[serde(default)]
    pub queue: Vec<EnemyKind>,
    /// Index of the next entry to release.
    #[serde(default)]
    pub index: usize,
    /// Seconds until the next release.
    #[serde(default)]
    pub timer: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_payload_fills_defaults() {
        let raw = r#"{
            "version": 1,
            "wave": 3,
            "towers": [{ "type": "pulse", "gridX": 2, "gridY": 2 }],
            "enemies": [{ "type": "tank", "x": 30, "y": 210, "hp": 50 }],
            "waveActive": true,
            "spawner": { "queue": ["basic", "fast"], "index": 1, "timer": 0.2 }
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(raw).expect("parse v1");
        assert_eq!(snapshot.money, STARTING_CREDITS);
        assert_eq!(snapshot.lives, STARTING_LIVES);
        assert_eq!(snapshot.map_id, MapId::Core);
        assert_eq!(snapshot.towers[0].level, 1);
        assert_eq!(snapshot.towers[0].path, None);
        let enemy = &snapshot.enemies[0];
        assert_eq!(enemy.path_index, 1);
        assert_eq!(enemy.slow_factor, 1.0);
        assert_eq!(enemy.max_hp, None);
        assert_eq!(snapshot.spawner.as_ref().map(|s| s.index), Some(1));
    }

    #[test]
    fn boss_shield_timer_is_read_as_shield_recharge() {
        let raw = r#"{ "type": "boss", "x": 0, "y": 0, "hp": 200, "bossShieldTimer": 2.5 }"#;
        let enemy: EnemyRecord = serde_json::from_str(raw).expect("parse enemy");
        assert_eq!(enemy.shield_recharge, Some(2.5));
    }

    #[test]
    fn fields_serialize_in_camel_case() {
        let value = serde_json::to_value(GameSnapshot::default()).expect("serialize");
        assert_eq!(value["version"], 3);
        assert_eq!(value["mapId"], "core");
        assert!(value.get("waveActive").is_some());
    }

    #[test]
    fn only_known_versions_are_supported() {
        assert!(is_supported_version(1));
        assert!(is_supported_version(SNAPSHOT_VERSION));
        assert!(!is_supported_version(0));
        assert!(!is_supported_version(4));
    }
}
