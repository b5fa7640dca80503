//! Enemy state, status timers and movement along the map path.

use training_defence_core::{
    effects::{BURN_POLICY, SHIELD_WARN_LEAD, SLOW_POLICY, STUN_POLICY},
    mitigated_damage, EnemyId, EnemyKind, EnemyRecord, EnemySnapshot, TimedEffect, WorldPoint,
};

/// What happened to an enemy during one status update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StatusOutcome {
    pub(crate) shield_raised: bool,
    pub(crate) minion_due: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: WorldPoint,
    pub(crate) hp: f32,
    pub(crate) max_hp: f32,
    pub(crate) path_index: usize,
    slow: TimedEffect,
    burn: TimedEffect,
    stun: TimedEffect,
    shield_timer: f32,
    shield_recharge: f32,
    shield_warn: bool,
    minion_timer: f32,
}

impl EnemyState {
    pub(crate) fn spawn(id: EnemyId, kind: EnemyKind, position: WorldPoint, path_index: usize) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            position,
            hp: profile.hp,
            max_hp: profile.hp,
            path_index,
            slow: TimedEffect::new(1.0, 0.0),
            burn: TimedEffect::default(),
            stun: TimedEffect::new(1.0, 0.0),
            shield_timer: 0.0,
            shield_recharge: profile.shield.map_or(0.0, |cycle| cycle.interval),
            shield_warn: false,
            minion_timer: profile.minions.map_or(0.0, |cycle| cycle.interval),
        }
    }

    pub(crate) fn from_record(id: EnemyId, record: &EnemyRecord) -> Self {
        let profile = record.kind.profile();
        let mut enemy = Self::spawn(
            id,
            record.kind,
            WorldPoint::new(record.x, record.y),
            record.path_index,
        );
        enemy.hp = record.hp;
        enemy.max_hp = record.max_hp.unwrap_or(profile.hp);
        enemy.slow = TimedEffect::new(record.slow_factor, record.slow_timer);
        enemy.burn = TimedEffect::new(record.burn_dps, record.burn_timer);
        enemy.stun = TimedEffect::new(1.0, record.stun_timer);
        enemy.shield_timer = record.shield_timer;
        enemy.shield_warn = record.shield_warn;
        if let Some(recharge) = record.shield_recharge {
            enemy.shield_recharge = recharge;
        }
        if let Some(timer) = record.boss_spawn_timer {
            enemy.minion_timer = timer;
        }
        enemy
    }

    pub(crate) fn record(&self) -> EnemyRecord {
        let profile = self.kind.profile();
        EnemyRecord {
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: Some(self.max_hp),
            path_index: self.path_index,
            slow_timer: self.slow.remaining,
            slow_factor: self.slow.magnitude,
            burn_timer: self.burn.remaining,
            burn_dps: self.burn.magnitude,
            stun_timer: self.stun.remaining,
            shield_timer: self.shield_timer,
            shield_warn: self.shield_warn,
            shield_recharge: profile.shield.map(|_| self.shield_recharge),
            boss_spawn_timer: profile.minions.map(|_| self.minion_timer),
        }
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            path_index: self.path_index,
            shielded: self.is_shielded(),
            shield_warn: self.shield_warn,
            stunned: self.stun.is_active(),
            slow_factor: self.slow_factor(),
        }
    }

    pub(crate) fn is_shielded(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    fn slow_factor(&self) -> f32 {
        if self.slow.is_active() {
            self.slow.magnitude
        } else {
            1.0
        }
    }

    /// Applies a hit after armor, pierce and shield mitigation.
    pub(crate) fn take_hit(&mut self, raw: f32, pierce: f32) {
        let armor = self.kind.profile().armor;
        self.hp -= mitigated_damage(raw, armor, pierce, self.is_shielded());
    }

    pub(crate) fn apply_slow(&mut self, factor: f32, duration: f32) {
        self.slow.stack(SLOW_POLICY, factor, duration);
    }

    pub(crate) fn apply_burn(&mut self, dps: f32, duration: f32) {
        self.burn.stack(BURN_POLICY, dps, duration);
    }

    pub(crate) fn apply_stun(&mut self, duration: f32) {
        self.stun.stack(STUN_POLICY, 1.0, duration);
    }

    /// Advances burn, regeneration, slow, shield and minion timers.
    pub(crate) fn update_status(&mut self, dt: f32) -> StatusOutcome {
        let profile = self.kind.profile();
        let mut outcome = StatusOutcome::default();

        let burn_dps = self.burn.magnitude;
        if self.burn.decay(dt) {
            self.take_hit(burn_dps * dt, 0.0);
        }
        if profile.regen > 0.0 {
            self.hp = (self.hp + profile.regen * dt).min(self.max_hp);
        }

        if self.slow.decay(dt) && !self.slow.is_active() {
            self.slow.magnitude = 1.0;
        }

        if let Some(cycle) = profile.shield {
            if self.is_shielded() {
                self.shield_timer -= dt;
                if self.shield_timer <= 0.0 {
                    self.shield_timer = 0.0;
                    self.shield_recharge = cycle.interval;
                }
                self.shield_warn = false;
            } else {
                self.shield_recharge -= dt;
                if self.shield_recharge <= 0.0 {
                    self.shield_timer = cycle.duration;
                    self.shield_warn = false;
                    outcome.shield_raised = true;
                } else {
                    self.shield_warn = self.shield_recharge <= SHIELD_WARN_LEAD;
                }
            }
        }

        if let Some(cycle) = profile.minions {
            self.minion_timer -= dt;
            if self.minion_timer <= 0.0 {
                self.minion_timer += cycle.interval;
                outcome.minion_due = true;
            }
        }

        outcome
    }

    /// Counts down an active stun; returns whether the enemy is held in place.
    pub(crate) fn hold_for_stun(&mut self, dt: f32) -> bool {
        self.stun.decay(dt)
    }

    /// Walks toward the next waypoints; returns whether the path end was reached.
    pub(crate) fn walk(&mut self, dt: f32, waypoints: &[WorldPoint]) -> bool {
        let speed = self.kind.profile().speed * self.slow_factor();
        let mut remaining = speed * dt;
        while remaining > 0.0 && self.path_index < waypoints.len() {
            let target = waypoints[self.path_index];
            let distance = self.position.distance(target);
            if distance <= remaining {
                self.position = target;
                self.path_index += 1;
                remaining -= distance;
            } else {
                let dx = (target.x - self.position.x) / distance;
                let dy = (target.y - self.position.y) / distance;
                self.position.x += dx * remaining;
                self.position.y += dy * remaining;
                remaining = 0.0;
            }
        }
        self.path_index >= waypoints.len()
    }
}

/// Ordered enemy collection with identifier allocation.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: Vec<EnemyState>,
    next_enemy_id: u32,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_enemy_id: 0,
        }
    }

    fn allocate(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.saturating_add(1);
        id
    }

    pub(crate) fn spawn(&mut self, kind: EnemyKind, position: WorldPoint, path_index: usize) -> EnemyId {
        let id = self.allocate();
        self.entries
            .push(EnemyState::spawn(id, kind, position, path_index));
        id
    }

    pub(crate) fn restore(&mut self, record: &EnemyRecord) -> EnemyId {
        let id = self.allocate();
        self.entries.push(EnemyState::from_record(id, record));
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&EnemyState> {
        self.entries.iter().find(|enemy| enemy.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut EnemyState> {
        self.entries.iter_mut().find(|enemy| enemy.id == id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<EnemyState> {
        let index = self.entries.iter().position(|enemy| enemy.id == id)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EnemyState> {
        self.entries.iter()
    }

    pub(crate) fn ids(&self) -> Vec<EnemyId> {
        self.entries.iter().map(|enemy| enemy.id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 30.0;

    fn line() -> Vec<WorldPoint> {
        vec![WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 0.0)]
    }

    #[test]
    fn walking_follows_the_polyline_and_reports_the_end() {
        let mut enemy = EnemyState::spawn(EnemyId::new(0), EnemyKind::Basic, WorldPoint::default(), 1);
        assert!(!enemy.walk(1.0, &line()));
        assert!((enemy.position.x - 55.0).abs() < 1e-4);
        assert!(enemy.walk(1.0, &line()));
        assert_eq!(enemy.position, WorldPoint::new(100.0, 0.0));
    }

    #[test]
    fn slow_scales_movement_until_it_lapses() {
        let mut enemy = EnemyState::spawn(EnemyId::new(0), EnemyKind::Basic, WorldPoint::default(), 1);
        enemy.apply_slow(0.5, 1.0);
        let _ = enemy.update_status(0.5);
        let _ = enemy.walk(0.5, &line());
        assert!((enemy.position.x - 13.75).abs() < 1e-4);
        let _ = enemy.update_status(0.6);
        assert_eq!(enemy.snapshot().slow_factor, 1.0);
    }

    #[test]
    fn burn_ticks_through_armor() {
        let mut tank = EnemyState::spawn(EnemyId::new(0), EnemyKind::Tank, WorldPoint::default(), 1);
        tank.apply_burn(10.0, 1.0);
        let _ = tank.update_status(0.5);
        assert!((tank.hp - (90.0 - 10.0 * 0.5 * 0.8)).abs() < 1e-4);
    }

    #[test]
    fn regeneration_is_capped_at_max_hp() {
        let mut regen = EnemyState::spawn(EnemyId::new(0), EnemyKind::Regen, WorldPoint::default(), 1);
        regen.hp = 69.0;
        let _ = regen.update_status(1.0);
        assert_eq!(regen.hp, 70.0);
    }

    #[test]
    fn shield_warns_then_rises_then_lapses() {
        let mut shield = EnemyState::spawn(EnemyId::new(0), EnemyKind::Shield, WorldPoint::default(), 1);
        let mut raised = 0;
        let mut warned = false;
        for _ in 0..(4.2 / DT) as usize {
            let outcome = shield.update_status(DT);
            warned |= shield.shield_warn;
            if outcome.shield_raised {
                raised += 1;
            }
        }
        assert!(warned);
        assert_eq!(raised, 1);
        assert!(shield.is_shielded());
        for _ in 0..(1.6 / DT) as usize {
            let _ = shield.update_status(DT);
        }
        assert!(!shield.is_shielded());
    }

    #[test]
    fn stun_holds_the_enemy_while_active() {
        let mut enemy = EnemyState::spawn(EnemyId::new(0), EnemyKind::Fast, WorldPoint::default(), 1);
        enemy.apply_stun(0.1);
        assert!(enemy.hold_for_stun(DT));
        assert!(enemy.snapshot().stunned);
    }

    #[test]
    fn records_restore_an_identical_enemy() {
        let mut boss = EnemyState::spawn(EnemyId::new(4), EnemyKind::Boss, WorldPoint::new(12.0, 40.0), 2);
        boss.apply_burn(6.0, 2.0);
        let _ = boss.update_status(0.3);
        let restored = EnemyState::from_record(EnemyId::new(4), &boss.record());
        assert_eq!(restored, boss);
    }
}
