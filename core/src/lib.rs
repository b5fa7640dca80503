#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Training Defence engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems read immutable views such as [`TowerView`] and
//! [`EnemyView`] and respond exclusively with new command batches.
//!
//! Static gameplay tables live in [`stats`] and [`maps`], the damage formula
//! and status-effect stacking rules in [`effects`], and the persisted snapshot
//! schema in [`snapshot`].

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod effects;
pub mod maps;
pub mod snapshot;
pub mod stats;

pub use effects::{mitigated_damage, StackPolicy, TimedEffect};
pub use maps::{MapDefinition, MapId, DEFAULT_MAP};
pub use snapshot::{EnemyRecord, GameSnapshot, SpawnerRecord, TowerRecord, SNAPSHOT_VERSION};
pub use stats::{
    sell_refund, upgrade_cost, BranchId, BranchModifiers, EnemyKind, EnemyProfile, MinionCycle,
    ShieldCycle, TowerKind, TowerProfile, TowerStats,
};

/// Number of tile columns on the playing field.
pub const GRID_COLUMNS: u32 = 12;
/// Number of tile rows on the playing field.
pub const GRID_ROWS: u32 = 8;
/// Side length of a single grid tile in world units.
pub const CELL_SIZE: f32 = 60.0;

/// Credits granted to a fresh run.
pub const STARTING_CREDITS: u32 = 140;
/// Lives granted to a fresh run.
pub const STARTING_LIVES: u32 = 20;

/// Duration of a single fixed logic step.
pub const LOGIC_STEP: Duration = Duration::from_nanos(33_333_333);
/// Largest wall-clock delta a single render frame may contribute.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(50);
/// Maximum number of live enemies on the field.
pub const POPULATION_CAP: usize = 80;
/// Maximum number of cosmetic projectile records kept alive.
pub const SHOT_CAP: usize = 160;
/// Maximum number of entries in a single wave's spawn queue.
pub const QUEUE_CAP: usize = 160;
/// Pacing delay between two queued spawns, in seconds.
pub const SPAWN_INTERVAL: f32 = 0.6;
/// Lifetime of a cosmetic projectile record, in seconds.
pub const SHOT_TTL: f32 = 0.12;
/// Flat credit grant for the first completed daily run of a calendar day.
pub const STREAK_BONUS: u32 = 50;
/// Number of independent save slots.
pub const SLOT_COUNT: u8 = 3;
/// Interval between periodic autosaves.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(2);
/// Number of entries retained by each leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 5;
/// Enemies below this hit point value are preferred when progress ties.
pub const LOW_HP_THRESHOLD: f32 = 20.0;
/// Highest level a tower can reach.
pub const MAX_TOWER_LEVEL: u8 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances spawner, enemy status timers, movement, and tower cooldowns.
    Tick {
        /// Duration of simulated time covered by the step.
        dt: Duration,
    },
    /// Ages projectile records and evaluates whether the active wave ended.
    FinishTick {
        /// Duration of simulated time covered by the step.
        dt: Duration,
    },
    /// Requests construction of a tower on the provided tile.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Tile that will host the tower.
        cell: GridCoord,
    },
    /// Selects the tower on the provided tile, or clears the selection.
    SelectTowerAt {
        /// Tile inspected for a tower.
        cell: GridCoord,
    },
    /// Raises the selected tower by one level.
    UpgradeSelected,
    /// Commits the selected level-1 tower to a branch, raising it to level 2.
    ChooseBranch {
        /// Branch adopted by the tower.
        branch: BranchId,
    },
    /// Sells the selected tower for a partial refund.
    SellSelected,
    /// Starts the next wave using the provided spawn queue.
    StartWave {
        /// Ordered enemy backlog consumed by the spawner.
        queue: Vec<EnemyKind>,
    },
    /// Flips the pause flag.
    TogglePause,
    /// Sets the pause flag explicitly.
    SetPaused {
        /// Desired pause state.
        paused: bool,
    },
    /// Switches to another map, starting a fresh run on it.
    SetMap {
        /// Map to activate.
        map: MapId,
    },
    /// Fires a ready tower at a primary target and optional chain victims.
    FireVolley {
        /// Tower releasing the volley.
        tower: TowerId,
        /// Enemy receiving the full hit.
        primary: EnemyId,
        /// Enemies receiving reduced chain damage, nearest first.
        chained: Vec<EnemyId>,
    },
    /// Grants credits and lives, e.g. for a campaign stage or streak bonus.
    GrantReward {
        /// Credits added to the balance.
        credits: u32,
        /// Lives added to the pool.
        lives: u32,
    },
    /// Discards the current run and starts a fresh one on the active map.
    ResetRun,
    /// Replaces the world state with a persisted snapshot.
    Restore {
        /// Snapshot to apply.
        snapshot: Box<GameSnapshot>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the step.
        dt: Duration,
    },
    /// Confirms that a tower was constructed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower constructed.
        kind: TowerKind,
        /// Tile occupied by the tower.
        cell: GridCoord,
        /// Credits spent.
        cost: u32,
    },
    /// Reports the tower selection after a selection command.
    TowerSelected {
        /// Newly selected tower, if any.
        tower: Option<TowerId>,
    },
    /// Confirms a level increase.
    TowerUpgraded {
        /// Upgraded tower.
        tower: TowerId,
        /// Level after the upgrade.
        level: u8,
        /// Credits spent.
        cost: u32,
    },
    /// Confirms that a tower committed to a branch.
    BranchChosen {
        /// Tower that adopted the branch.
        tower: TowerId,
        /// Adopted branch.
        branch: BranchId,
        /// Credits spent.
        cost: u32,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Removed tower.
        tower: TowerId,
        /// Credits refunded.
        refund: u32,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// Wave number that began.
        wave: u32,
        /// Number of queued spawns.
        queued: usize,
    },
    /// Confirms that the spawner released an enemy.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
    },
    /// Reports that a boss released a minion.
    MinionSpawned {
        /// Boss that released the minion.
        boss: EnemyId,
        /// Identifier assigned to the minion.
        minion: EnemyId,
        /// Type of the minion.
        kind: EnemyKind,
    },
    /// Reports that an enemy raised its damage-reduction shield.
    ShieldRaised {
        /// Shielded enemy.
        enemy: EnemyId,
    },
    /// Reports that a tower fired a volley.
    VolleyFired {
        /// Tower that fired.
        tower: TowerId,
        /// Number of enemies hit, primary included.
        hits: usize,
    },
    /// Reports that an enemy died and paid out its reward.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Credits granted.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyEscaped {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Lives left after the breach.
        lives_remaining: u32,
    },
    /// Reports that the spawner is exhausted and the field is clear.
    WaveCleared {
        /// Wave that ended.
        wave: u32,
    },
    /// Reports that the last life was lost.
    GameOver {
        /// Wave during which the run ended.
        wave: u32,
    },
    /// Reports a change of the pause flag.
    PauseChanged {
        /// Pause state after the change.
        paused: bool,
    },
    /// Reports that a different map became active.
    MapChanged {
        /// Active map.
        map: MapId,
    },
    /// Reports that credits and lives were granted.
    RewardGranted {
        /// Credits added.
        credits: u32,
        /// Lives added.
        lives: u32,
    },
    /// Reports that a fresh run started on the active map.
    RunReset,
    /// Reports that a persisted snapshot replaced the world state.
    SnapshotRestored {
        /// Map activated by the snapshot.
        map: MapId,
        /// Wave counter restored from the snapshot.
        wave: u32,
    },
    /// Reports that a command was rejected without mutating state.
    CommandRejected {
        /// Reason the command was refused.
        reason: Rejection,
    },
}

/// Reasons a command may be refused by the world or the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// The requested tile lies outside the grid.
    #[error("tile is outside the field")]
    OutOfBounds,
    /// The requested tile belongs to the enemy path.
    #[error("tile is part of the path")]
    PathTile,
    /// The requested tile already hosts a tower.
    #[error("tile is occupied")]
    Occupied,
    /// The balance does not cover the cost.
    #[error("{required} credits required, {available} available")]
    InsufficientCredits {
        /// Credits the action costs.
        required: u32,
        /// Credits currently held.
        available: u32,
    },
    /// No tower is selected.
    #[error("no tower selected")]
    NoSelection,
    /// A level-1 tower must choose a branch before upgrading.
    #[error("choose a branch first")]
    BranchRequired,
    /// The tower already left level 1 and can no longer pick a branch.
    #[error("branch already fixed")]
    BranchLocked,
    /// The branch belongs to another tower type.
    #[error("branch not available for this tower")]
    BranchUnavailable,
    /// The tower is already at its maximum level.
    #[error("tower is at max level")]
    MaxLevel,
    /// A wave is already running.
    #[error("wave already active")]
    WaveActive,
    /// The map cannot change while a wave is live or enemies remain.
    #[error("map locked while the field is active")]
    FieldNotClear,
    /// The requested map is already active.
    #[error("map already active")]
    MapUnchanged,
    /// The requested map lies beyond the unlocked campaign frontier.
    #[error("map not unlocked")]
    MapNotUnlocked,
    /// The run ended; only reset, load, or a map change recover.
    #[error("system down")]
    SystemDown,
    /// A snapshot failed structural validation.
    #[error("snapshot is invalid")]
    InvalidSnapshot,
}

/// Visual colour applied to towers, enemies, and projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a new colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    column: u32,
    row: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the tile lies inside the playing field.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.column < GRID_COLUMNS && self.row < GRID_ROWS
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            self.column as f32 * CELL_SIZE + CELL_SIZE / 2.0,
            self.row as f32 * CELL_SIZE + CELL_SIZE / 2.0,
        )
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.column, self.row)
    }
}

/// Continuous position on the playing field measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_sq(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        self.distance_sq(other).sqrt()
    }
}

/// Transient cosmetic record of a hit; has no gameplay effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    /// Start of the beam.
    pub from: WorldPoint,
    /// End of the beam.
    pub to: WorldPoint,
    /// Remaining lifetime in seconds.
    pub ttl: f32,
    /// Colour of the firing tower.
    pub color: Rgb,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Tile occupied by the tower.
    pub cell: GridCoord,
    /// Centre of the occupied tile.
    pub position: WorldPoint,
    /// Current level, 1 through 3.
    pub level: u8,
    /// Branch chosen at the first upgrade, if any.
    pub branch: Option<BranchId>,
    /// Seconds until the tower may fire again; ready at or below zero.
    pub cooldown: f32,
    /// Effective stats for the current level and branch.
    pub stats: TowerStats,
}

impl TowerSnapshot {
    /// Reports whether the tower may fire this step.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }
}

/// Read-only snapshot describing all towers placed on the field.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Current position.
    pub position: WorldPoint,
    /// Remaining hit points.
    pub hp: f32,
    /// Hit points at spawn.
    pub max_hp: f32,
    /// Index of the waypoint the enemy walks toward.
    pub path_index: usize,
    /// Indicates whether the damage-reduction shield is up.
    pub shielded: bool,
    /// Indicates that the shield is about to rise.
    pub shield_warn: bool,
    /// Indicates whether an EMP stun halts the enemy.
    pub stunned: bool,
    /// Current movement multiplier from slow effects.
    pub slow_factor: f32,
}

/// Read-only snapshot describing all enemies on the field.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up an enemy by identifier.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Primary target assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that acquired the target.
    pub tower: TowerId,
    /// Enemy selected as primary target.
    pub enemy: EnemyId,
    /// Position of the targeted enemy when the assignment was made.
    pub enemy_position: WorldPoint,
}

/// Error returned when parsing an identifier from text fails.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseIdError {
    kind: &'static str,
    value: String,
}

impl ParseIdError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

macro_rules! impl_identifier_text {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = ParseIdError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let needle = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| ParseIdError::new($kind, needle))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_identifier_text!(TowerKind, "tower type");
impl_identifier_text!(EnemyKind, "enemy type");
impl_identifier_text!(BranchId, "branch");
impl_identifier_text!(MapId, "map");
