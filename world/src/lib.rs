#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Training Defence.
//!
//! The world owns credits, lives, the wave counter, towers, enemies, cosmetic
//! shots and the wave spawner. It changes only through [`apply`] and exposes
//! read-only access through the [`query`] module.

mod enemies;
mod path;
mod towers;

use std::collections::BTreeSet;

use training_defence_core::{
    sell_refund, snapshot::is_supported_version, upgrade_cost, BranchId, Command, EnemyId,
    EnemyKind, EnemyRecord, Event, GameSnapshot, GridCoord, MapId, Rejection, Rgb, Shot,
    SpawnerRecord, TowerId, TowerKind, WorldPoint, DEFAULT_MAP, MAX_TOWER_LEVEL, POPULATION_CAP,
    QUEUE_CAP, SHOT_CAP, SHOT_TTL, SPAWN_INTERVAL, STARTING_CREDITS, STARTING_LIVES,
};
use tracing::debug;

use enemies::EnemyRoster;
pub use path::MapPath;
use towers::TowerRegistry;

/// Pacing state of the running wave.
#[derive(Clone, Debug, PartialEq)]
struct Spawner {
    queue: Vec<EnemyKind>,
    index: usize,
    timer: f32,
}

impl Spawner {
    fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.index)
    }

    fn record(&self) -> SpawnerRecord {
        SpawnerRecord {
            queue: self.queue.clone(),
            index: self.index,
            timer: self.timer,
        }
    }
}

/// Represents the authoritative Training Defence world state.
#[derive(Debug)]
pub struct World {
    path: MapPath,
    credits: u32,
    lives: u32,
    wave: u32,
    kills: u32,
    run_time: f64,
    towers: TowerRegistry,
    enemies: EnemyRoster,
    shots: Vec<Shot>,
    spawner: Option<Spawner>,
    wave_active: bool,
    paused: bool,
    selected: Option<TowerId>,
}

impl World {
    /// Creates a fresh run on the default map.
    #[must_use]
    pub fn new() -> Self {
        Self::with_map(DEFAULT_MAP)
    }

    /// Creates a fresh run on the provided map.
    #[must_use]
    pub fn with_map(map: MapId) -> Self {
        Self {
            path: MapPath::resolve(map),
            credits: STARTING_CREDITS,
            lives: STARTING_LIVES,
            wave: 0,
            kills: 0,
            run_time: 0.0,
            towers: TowerRegistry::new(),
            enemies: EnemyRoster::new(),
            shots: Vec::new(),
            spawner: None,
            wave_active: false,
            paused: false,
            selected: None,
        }
    }

    fn reset(&mut self, map: MapId) {
        *self = Self::with_map(map);
    }

    fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    fn charge(&mut self, cost: u32) -> Result<(), Rejection> {
        if self.credits < cost {
            return Err(Rejection::InsufficientCredits {
                required: cost,
                available: self.credits,
            });
        }
        self.credits -= cost;
        Ok(())
    }

    fn place_tower(&mut self, kind: TowerKind, cell: GridCoord) -> Result<Event, Rejection> {
        if !cell.in_bounds() {
            return Err(Rejection::OutOfBounds);
        }
        if self.path.contains(cell) {
            return Err(Rejection::PathTile);
        }
        if self.towers.find_at(cell).is_some() {
            return Err(Rejection::Occupied);
        }
        let cost = kind.profile().cost;
        self.charge(cost)?;
        let tower = self.towers.insert(kind, cell);
        Ok(Event::TowerPlaced {
            tower,
            kind,
            cell,
            cost,
        })
    }

    fn upgrade_selected(&mut self) -> Result<Event, Rejection> {
        let id = self.selected.ok_or(Rejection::NoSelection)?;
        let tower = self.towers.get(id).ok_or(Rejection::NoSelection)?;
        if tower.level >= MAX_TOWER_LEVEL {
            return Err(Rejection::MaxLevel);
        }
        if tower.level == 1 {
            return Err(Rejection::BranchRequired);
        }
        let cost = upgrade_cost(tower.kind, tower.level).ok_or(Rejection::MaxLevel)?;
        self.charge(cost)?;
        let tower = self.towers.get_mut(id).ok_or(Rejection::NoSelection)?;
        tower.level += 1;
        Ok(Event::TowerUpgraded {
            tower: id,
            level: tower.level,
            cost,
        })
    }

    fn choose_branch(&mut self, branch: BranchId) -> Result<Event, Rejection> {
        let id = self.selected.ok_or(Rejection::NoSelection)?;
        let tower = self.towers.get(id).ok_or(Rejection::NoSelection)?;
        if branch.tower() != tower.kind {
            return Err(Rejection::BranchUnavailable);
        }
        if tower.level != 1 || tower.branch.is_some() {
            return Err(Rejection::BranchLocked);
        }
        let cost = upgrade_cost(tower.kind, tower.level).ok_or(Rejection::MaxLevel)?;
        self.charge(cost)?;
        let tower = self.towers.get_mut(id).ok_or(Rejection::NoSelection)?;
        tower.branch = Some(branch);
        tower.level = 2;
        Ok(Event::BranchChosen {
            tower: id,
            branch,
            cost,
        })
    }

    fn sell_selected(&mut self) -> Result<Event, Rejection> {
        let id = self.selected.ok_or(Rejection::NoSelection)?;
        let tower = self.towers.remove(id).ok_or(Rejection::NoSelection)?;
        self.selected = None;
        let refund = sell_refund(tower.kind, tower.level);
        self.credits = self.credits.saturating_add(refund);
        Ok(Event::TowerSold { tower: id, refund })
    }

    fn start_wave(&mut self, mut queue: Vec<EnemyKind>) -> Result<Event, Rejection> {
        if self.is_game_over() {
            return Err(Rejection::SystemDown);
        }
        if self.wave_active {
            return Err(Rejection::WaveActive);
        }
        queue.truncate(QUEUE_CAP);
        self.wave = self.wave.saturating_add(1);
        let queued = queue.len();
        self.spawner = Some(Spawner {
            queue,
            index: 0,
            timer: 0.0,
        });
        self.wave_active = true;
        debug!(wave = self.wave, queued, "wave started");
        Ok(Event::WaveStarted {
            wave: self.wave,
            queued,
        })
    }

    fn set_map(&mut self, map: MapId) -> Result<Event, Rejection> {
        let field_active = self.wave_active || !self.enemies.is_empty();
        if field_active && !self.is_game_over() {
            return Err(Rejection::FieldNotClear);
        }
        if map == self.path.map() {
            return Err(Rejection::MapUnchanged);
        }
        self.reset(map);
        Ok(Event::MapChanged { map })
    }

    fn restore(&mut self, snapshot: &GameSnapshot) -> Result<Event, Rejection> {
        let path = MapPath::resolve(snapshot.map_id);
        validate_snapshot(snapshot, &path)?;

        let mut world = Self::with_map(snapshot.map_id);
        world.credits = snapshot.money;
        world.lives = snapshot.lives;
        world.wave = snapshot.wave;
        world.kills = snapshot.kills;
        world.run_time = snapshot.run_time;
        for record in &snapshot.towers {
            let _ = world.towers.insert_record(
                record.kind,
                GridCoord::new(record.grid_x, record.grid_y),
                record.level,
                record.path,
                record.cooldown,
            );
        }
        for record in &snapshot.enemies {
            let _ = world.enemies.restore(record);
        }
        world.spawner = snapshot.spawner.as_ref().map(|record| Spawner {
            queue: record.queue.clone(),
            index: record.index,
            timer: record.timer,
        });
        world.wave_active = snapshot.wave_active;
        world.paused = snapshot.paused;
        *self = world;
        debug!(map = %snapshot.map_id, wave = snapshot.wave, "snapshot restored");
        Ok(Event::SnapshotRestored {
            map: snapshot.map_id,
            wave: snapshot.wave,
        })
    }

    fn tick(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        if self.wave_active {
            self.run_time += f64::from(dt);
            self.advance_spawner(dt, out_events);
        }
        self.advance_enemies(dt, out_events);
        for tower in self.towers.iter_mut() {
            tower.cooldown = (tower.cooldown - dt).max(0.0);
        }
    }

    fn advance_spawner(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let Some(spawner) = self.spawner.as_mut() else {
            return;
        };
        spawner.timer -= dt;
        if spawner.timer > 0.0 {
            return;
        }
        if spawner.index >= spawner.queue.len() {
            self.spawner = None;
            return;
        }
        if self.enemies.len() >= POPULATION_CAP {
            return;
        }
        let kind = spawner.queue[spawner.index];
        spawner.index += 1;
        spawner.timer = SPAWN_INTERVAL;
        let enemy = self.enemies.spawn(kind, self.path.start(), 1);
        out_events.push(Event::EnemySpawned { enemy, kind });
    }

    fn advance_enemies(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let mut minions: Vec<(EnemyId, WorldPoint, usize, EnemyKind)> = Vec::new();
        for id in self.enemies.ids() {
            let Some(enemy) = self.enemies.get_mut(id) else {
                continue;
            };
            let outcome = enemy.update_status(dt);
            if enemy.is_dead() {
                self.kill(id, out_events);
                continue;
            }
            if outcome.shield_raised {
                out_events.push(Event::ShieldRaised { enemy: id });
            }
            if outcome.minion_due {
                if let Some(cycle) = enemy.kind.profile().minions {
                    minions.push((id, enemy.position, enemy.path_index, cycle.kind));
                }
            }
            if enemy.hold_for_stun(dt) {
                continue;
            }
            if enemy.walk(dt, self.path.waypoints()) {
                self.escape(id, out_events);
            }
        }

        for (boss, position, path_index, kind) in minions {
            if self.enemies.len() >= POPULATION_CAP {
                break;
            }
            let minion = self.enemies.spawn(kind, position, path_index);
            out_events.push(Event::MinionSpawned { boss, minion, kind });
        }
    }

    fn kill(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(id) else {
            return;
        };
        let reward = enemy.kind.profile().reward;
        self.credits = self.credits.saturating_add(reward);
        self.kills = self.kills.saturating_add(1);
        out_events.push(Event::EnemyKilled {
            enemy: id,
            kind: enemy.kind,
            reward,
        });
    }

    fn escape(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        if self.enemies.remove(id).is_none() {
            return;
        }
        let was_alive = !self.is_game_over();
        self.lives = self.lives.saturating_sub(1);
        out_events.push(Event::EnemyEscaped {
            enemy: id,
            lives_remaining: self.lives,
        });
        if was_alive && self.is_game_over() {
            self.wave_active = false;
            self.spawner = None;
            debug!(wave = self.wave, "system down");
            out_events.push(Event::GameOver { wave: self.wave });
        }
    }

    fn push_shot(&mut self, from: WorldPoint, to: WorldPoint, color: Rgb) {
        if self.shots.len() >= SHOT_CAP {
            let _ = self.shots.remove(0);
        }
        self.shots.push(Shot {
            from,
            to,
            ttl: SHOT_TTL,
            color,
        });
    }

    fn fire_volley(
        &mut self,
        tower_id: TowerId,
        primary: EnemyId,
        chained: Vec<EnemyId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(tower) = self.towers.get(tower_id) else {
            return;
        };
        if tower.cooldown > 0.0 {
            return;
        }
        let stats = tower.stats();
        let origin = tower.cell.center();
        let color = tower.kind.profile().color;
        let Some(target) = self.enemies.get(primary) else {
            return;
        };
        if origin.distance_sq(target.position) > stats.range * stats.range {
            return;
        }
        let anchor = target.position;

        if let Some(tower) = self.towers.get_mut(tower_id) {
            tower.cooldown = stats.cooldown;
        }
        if let Some(target) = self.enemies.get_mut(primary) {
            target.take_hit(stats.damage, stats.armor_pierce);
            if let Some(factor) = stats.slow_factor {
                target.apply_slow(factor, stats.slow_time);
            }
            if stats.burn_dps > 0.0 && stats.burn_time > 0.0 {
                target.apply_burn(stats.burn_dps, stats.burn_time);
            }
            if stats.emp_time > 0.0 {
                target.apply_stun(stats.emp_time);
            }
        }
        self.push_shot(origin, anchor, color);

        let chain_range_sq = stats.chain_range * stats.chain_range;
        let chain_limit = usize::try_from(stats.chain_count).unwrap_or(usize::MAX);
        let mut hits = vec![primary];
        for id in chained {
            if hits.len() > chain_limit {
                break;
            }
            if hits.contains(&id) {
                continue;
            }
            let Some(victim) = self.enemies.get_mut(id) else {
                continue;
            };
            if anchor.distance_sq(victim.position) > chain_range_sq {
                continue;
            }
            victim.take_hit(stats.damage * stats.chain_falloff, stats.armor_pierce);
            let position = victim.position;
            self.push_shot(anchor, position, color);
            hits.push(id);
        }

        out_events.push(Event::VolleyFired {
            tower: tower_id,
            hits: hits.len(),
        });
        for id in hits {
            if self.enemies.get(id).is_some_and(|enemy| enemy.is_dead()) {
                self.kill(id, out_events);
            }
        }
    }

    fn finish_tick(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for shot in &mut self.shots {
            shot.ttl -= dt;
        }
        self.shots.retain(|shot| shot.ttl > 0.0);

        if self.wave_active && self.spawner.is_none() && self.enemies.is_empty() {
            self.wave_active = false;
            debug!(wave = self.wave, kills = self.kills, "wave cleared");
            out_events.push(Event::WaveCleared { wave: self.wave });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_snapshot(snapshot: &GameSnapshot, path: &MapPath) -> Result<(), Rejection> {
    if !is_supported_version(snapshot.version) {
        return Err(Rejection::InvalidSnapshot);
    }

    let mut occupied = BTreeSet::new();
    for record in &snapshot.towers {
        let cell = GridCoord::new(record.grid_x, record.grid_y);
        let level_valid = (1..=MAX_TOWER_LEVEL).contains(&record.level);
        let branch_valid = record
            .path
            .map_or(true, |branch| branch.tower() == record.kind && record.level >= 2);
        if !cell.in_bounds()
            || path.contains(cell)
            || !occupied.insert(cell)
            || !level_valid
            || !branch_valid
            || !record.cooldown.is_finite()
        {
            return Err(Rejection::InvalidSnapshot);
        }
    }

    let waypoint_count = path.waypoints().len();
    for record in &snapshot.enemies {
        let finite = record.x.is_finite() && record.y.is_finite() && record.hp.is_finite();
        let max_hp_valid = record
            .max_hp
            .map_or(true, |max_hp| max_hp.is_finite() && max_hp > 0.0);
        if !finite
            || !max_hp_valid
            || !status_valid(record)
            || record.path_index >= waypoint_count
        {
            return Err(Rejection::InvalidSnapshot);
        }
    }

    if let Some(spawner) = &snapshot.spawner {
        if spawner.queue.len() > QUEUE_CAP
            || spawner.index > spawner.queue.len()
            || !spawner.timer.is_finite()
        {
            return Err(Rejection::InvalidSnapshot);
        }
    }

    if !snapshot.run_time.is_finite() || snapshot.run_time < 0.0 {
        return Err(Rejection::InvalidSnapshot);
    }

    Ok(())
}

/// Timers count down past zero between updates, so only their finiteness is
/// checked. Magnitudes must stay in range: a slow multiplies speed within
/// `(0, 1]` and burns never heal.
fn status_valid(record: &EnemyRecord) -> bool {
    let timers = [
        record.slow_timer,
        record.burn_timer,
        record.stun_timer,
        record.shield_timer,
    ];
    let cycles = [record.shield_recharge, record.boss_spawn_timer];
    timers
        .into_iter()
        .chain(cycles.into_iter().flatten())
        .all(f32::is_finite)
        && record.slow_factor > 0.0
        && record.slow_factor <= 1.0
        && record.burn_dps.is_finite()
        && record.burn_dps >= 0.0
}

fn respond(result: Result<Event, Rejection>, out_events: &mut Vec<Event>) {
    match result {
        Ok(event) => out_events.push(event),
        Err(reason) => out_events.push(Event::CommandRejected { reason }),
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and answer with
/// [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if world.paused || world.is_game_over() {
                return;
            }
            out_events.push(Event::TimeAdvanced { dt });
            world.tick(dt.as_secs_f32(), out_events);
        }
        Command::FinishTick { dt } => {
            if world.paused || world.is_game_over() {
                return;
            }
            world.finish_tick(dt.as_secs_f32(), out_events);
        }
        Command::PlaceTower { kind, cell } => respond(world.place_tower(kind, cell), out_events),
        Command::SelectTowerAt { cell } => {
            world.selected = world.towers.find_at(cell).map(|tower| tower.id);
            out_events.push(Event::TowerSelected {
                tower: world.selected,
            });
        }
        Command::UpgradeSelected => respond(world.upgrade_selected(), out_events),
        Command::ChooseBranch { branch } => respond(world.choose_branch(branch), out_events),
        Command::SellSelected => respond(world.sell_selected(), out_events),
        Command::StartWave { queue } => respond(world.start_wave(queue), out_events),
        Command::TogglePause => {
            world.paused = !world.paused;
            out_events.push(Event::PauseChanged {
                paused: world.paused,
            });
        }
        Command::SetPaused { paused } => {
            world.paused = paused;
            out_events.push(Event::PauseChanged { paused });
        }
        Command::SetMap { map } => respond(world.set_map(map), out_events),
        Command::FireVolley {
            tower,
            primary,
            chained,
        } => world.fire_volley(tower, primary, chained, out_events),
        Command::GrantReward { credits, lives } => {
            world.credits = world.credits.saturating_add(credits);
            world.lives = world.lives.saturating_add(lives);
            out_events.push(Event::RewardGranted { credits, lives });
        }
        Command::ResetRun => {
            let map = world.path.map();
            world.reset(map);
            out_events.push(Event::RunReset);
        }
        Command::Restore { snapshot } => respond(world.restore(&snapshot), out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use training_defence_core::{
        EnemyView, GameSnapshot, MapId, Shot, TowerSnapshot, TowerView, SNAPSHOT_VERSION,
    };

    use super::{MapPath, World};

    /// Credits currently held.
    #[must_use]
    pub fn credits(world: &World) -> u32 {
        world.credits
    }

    /// Lives left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Current wave counter; zero before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Enemies killed during the run.
    #[must_use]
    pub fn kills(world: &World) -> u32 {
        world.kills
    }

    /// Simulated seconds spent inside waves during the run.
    #[must_use]
    pub fn run_time(world: &World) -> f64 {
        world.run_time
    }

    /// Active map.
    #[must_use]
    pub fn map(world: &World) -> MapId {
        world.path.map()
    }

    /// Resolved path of the active map.
    #[must_use]
    pub fn path(world: &World) -> &MapPath {
        &world.path
    }

    /// Reports whether a wave is running.
    #[must_use]
    pub fn is_wave_active(world: &World) -> bool {
        world.wave_active
    }

    /// Reports whether logic advance is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Reports whether the run ended because no lives remain.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.is_game_over()
    }

    /// Number of enemies still waiting in the spawner.
    #[must_use]
    pub fn pending_spawns(world: &World) -> usize {
        world.spawner.as_ref().map_or(0, |spawner| spawner.remaining())
    }

    /// Currently selected tower, if any.
    #[must_use]
    pub fn selected_tower(world: &World) -> Option<TowerSnapshot> {
        world
            .selected
            .and_then(|id| world.towers.get(id))
            .map(|tower| tower.snapshot())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures a read-only view of the enemies on the field.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Cosmetic projectile records still alive.
    #[must_use]
    pub fn shots(world: &World) -> &[Shot] {
        &world.shots
    }

    /// Serializable snapshot of the run. Run identity, daily seed and save
    /// timestamp are left at their defaults for the caller to fill in.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            version: SNAPSHOT_VERSION,
            money: world.credits,
            lives: world.lives,
            wave: world.wave,
            map_id: world.path.map(),
            kills: world.kills,
            run_time: world.run_time,
            towers: world.towers.iter().map(|tower| tower.record()).collect(),
            enemies: world.enemies.iter().map(|enemy| enemy.record()).collect(),
            wave_active: world.wave_active,
            spawner: world.spawner.as_ref().map(|spawner| spawner.record()),
            paused: world.paused,
            ..GameSnapshot::default()
        }
    }
}
