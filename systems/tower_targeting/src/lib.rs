#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use training_defence_core::{
    EnemyId, EnemyView, TowerSnapshot, TowerTarget, TowerView, WorldPoint, LOW_HP_THRESHOLD,
};

/// Score bonus given to enemies below the low hit point threshold.
const LOW_HP_BONUS: f32 = 0.2;

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// Each ready tower picks the in-range enemy that progressed furthest along
    /// the path; enemies below the low hit point threshold win close calls.
    /// On equal scores the enemy that spawned first is kept. The output buffer
    /// is cleared before populating it with the latest assignments.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        out.extend(
            towers
                .iter()
                .filter(|tower| tower.is_ready())
                .filter_map(|tower| self.pick(tower)),
        );
    }

    /// Picks the target of a single ready tower against `enemies`.
    ///
    /// Hosts call this once per tower with a view taken after the previous
    /// volley landed, so a tower never aims at an enemy that already died
    /// this step.
    pub fn select(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) -> Option<TowerTarget> {
        if !tower.is_ready() || enemies.is_empty() {
            return None;
        }
        self.prepare_enemy_workspace(enemies);
        self.pick(tower)
    }

    fn pick(&self, tower: &TowerSnapshot) -> Option<TowerTarget> {
        let max_distance = tower.stats.range * tower.stats.range;
        let mut best: Option<&EnemyCandidate> = None;

        for candidate in &self.enemy_workspace {
            if tower.position.distance_sq(candidate.position) > max_distance {
                continue;
            }
            match best {
                Some(existing) if candidate.score <= existing.score => {}
                _ => best = Some(candidate),
            }
        }

        best.map(|best| TowerTarget {
            tower: tower.id,
            enemy: best.id,
            enemy_position: best.position,
        })
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            let bonus = if snapshot.hp < LOW_HP_THRESHOLD {
                LOW_HP_BONUS
            } else {
                0.0
            };
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
                score: snapshot.path_index as f32 + bonus,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: WorldPoint,
    score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use training_defence_core::{EnemyKind, EnemySnapshot, GridCoord, TowerId, TowerKind, TowerStats};

    fn tower(id: u32, cell: (u32, u32), cooldown: f32) -> TowerSnapshot {
        let cell = GridCoord::new(cell.0, cell.1);
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Pulse,
            cell,
            position: cell.center(),
            level: 1,
            branch: None,
            cooldown,
            stats: TowerStats::resolve(TowerKind::Pulse, 1, None),
        }
    }

    fn enemy(id: u32, x: f32, y: f32, path_index: usize, hp: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Basic,
            position: WorldPoint::new(x, y),
            hp,
            max_hp: 40.0,
            path_index,
            shielded: false,
            shield_warn: false,
            stunned: false,
            slow_factor: 1.0,
        }
    }

    fn targets(towers: Vec<TowerSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<TowerTarget> {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();
        system.handle(
            &TowerView::from_snapshots(towers),
            &EnemyView::from_snapshots(enemies),
            &mut out,
        );
        out
    }

    #[test]
    fn furthest_progressed_enemy_in_range_is_chosen() {
        let out = targets(
            vec![tower(0, (2, 2), 0.0)],
            vec![enemy(1, 150.0, 200.0, 1, 40.0), enemy(2, 160.0, 100.0, 3, 40.0)],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, EnemyId::new(2));
        assert_eq!(out[0].enemy_position, WorldPoint::new(160.0, 100.0));
    }

    #[test]
    fn enemies_outside_range_are_ignored() {
        let out = targets(
            vec![tower(0, (2, 2), 0.0)],
            vec![enemy(1, 600.0, 400.0, 5, 40.0)],
        );
        assert!(out.is_empty());
    }

    #[test]
    fn low_hp_breaks_progress_ties() {
        let out = targets(
            vec![tower(0, (2, 2), 0.0)],
            vec![enemy(1, 150.0, 200.0, 2, 40.0), enemy(2, 150.0, 120.0, 2, 12.0)],
        );
        assert_eq!(out[0].enemy, EnemyId::new(2));
    }

    #[test]
    fn earliest_spawn_wins_exact_ties() {
        let out = targets(
            vec![tower(0, (2, 2), 0.0)],
            vec![enemy(7, 150.0, 200.0, 2, 40.0), enemy(3, 150.0, 120.0, 2, 40.0)],
        );
        assert_eq!(out[0].enemy, EnemyId::new(3));
    }

    #[test]
    fn cooling_towers_do_not_target() {
        let out = targets(
            vec![tower(0, (2, 2), 0.3), tower(1, (3, 2), 0.0)],
            vec![enemy(1, 180.0, 180.0, 1, 40.0)],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tower, TowerId::new(1));
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        assert!(targets(Vec::new(), vec![enemy(1, 0.0, 0.0, 1, 40.0)]).is_empty());
        assert!(targets(vec![tower(0, (0, 0), 0.0)], Vec::new()).is_empty());
    }

    #[test]
    fn select_sees_only_the_enemies_it_is_given() {
        let mut system = TowerTargeting::new();
        let ready = tower(0, (2, 2), 0.0);
        let full = EnemyView::from_snapshots(vec![
            enemy(1, 150.0, 200.0, 1, 40.0),
            enemy(2, 160.0, 100.0, 3, 5.0),
        ]);
        let after_kill = EnemyView::from_snapshots(vec![enemy(1, 150.0, 200.0, 1, 40.0)]);

        let first = system.select(&ready, &full).expect("target in range");
        assert_eq!(first.enemy, EnemyId::new(2));
        let second = system.select(&ready, &after_kill).expect("target in range");
        assert_eq!(second.enemy, EnemyId::new(1));
        assert!(system.select(&tower(1, (2, 2), 0.4), &full).is_none());
    }
}
