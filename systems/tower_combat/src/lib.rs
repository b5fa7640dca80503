#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits volley commands from targeting data.

use training_defence_core::{Command, EnemyId, EnemyView, TowerSnapshot, TowerTarget, TowerView};

/// Tower combat system that queues volleys for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
    chain_workspace: Vec<(f32, EnemyId)>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireVolley` entries for towers ready to fire.
    ///
    /// Chain victims are the enemies nearest to the primary target within the
    /// tower's chain radius, at most the tower's chain count. Chains do not
    /// propagate further than one jump from the primary target.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(tower) = towers.get(target.tower) else {
                continue;
            };
            if !tower.is_ready() {
                continue;
            }

            let volley = self.volley(tower, enemies, target);
            self.scratch.push(volley);
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    /// Builds the volley a single tower fires at its resolved target.
    pub fn volley(
        &mut self,
        tower: &TowerSnapshot,
        enemies: &EnemyView,
        target: &TowerTarget,
    ) -> Command {
        let chained = self.chain_victims(
            enemies,
            target,
            tower.stats.chain_count,
            tower.stats.chain_range,
        );
        Command::FireVolley {
            tower: tower.id,
            primary: target.enemy,
            chained,
        }
    }

    fn chain_victims(
        &mut self,
        enemies: &EnemyView,
        target: &TowerTarget,
        chain_count: u32,
        chain_range: f32,
    ) -> Vec<EnemyId> {
        if chain_count == 0 {
            return Vec::new();
        }

        let range_sq = chain_range * chain_range;
        self.chain_workspace.clear();
        for enemy in enemies.iter() {
            if enemy.id == target.enemy {
                continue;
            }
            let distance_sq = target.enemy_position.distance_sq(enemy.position);
            if distance_sq <= range_sq {
                self.chain_workspace.push((distance_sq, enemy.id));
            }
        }
        self.chain_workspace
            .sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let limit = usize::try_from(chain_count).unwrap_or(usize::MAX);
        self.chain_workspace
            .iter()
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use training_defence_core::{
        EnemyKind, EnemySnapshot, GridCoord, TowerId, TowerKind, TowerStats, WorldPoint,
    };

    fn tower(id: u32, kind: TowerKind, cooldown: f32) -> TowerSnapshot {
        let cell = GridCoord::new(2, 2);
        TowerSnapshot {
            id: TowerId::new(id),
            kind,
            cell,
            position: cell.center(),
            level: 1,
            branch: None,
            cooldown,
            stats: TowerStats::resolve(kind, 1, None),
        }
    }

    fn enemy(id: u32, x: f32, y: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Swarm,
            position: WorldPoint::new(x, y),
            hp: 18.0,
            max_hp: 18.0,
            path_index: 1,
            shielded: false,
            shield_warn: false,
            stunned: false,
            slow_factor: 1.0,
        }
    }

    fn target(tower: u32, enemy: u32, position: WorldPoint) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemy: EnemyId::new(enemy),
            enemy_position: position,
        }
    }

    #[test]
    fn single_target_towers_fire_without_chains() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![tower(1, TowerKind::Pulse, 0.0)]);
        let enemies = EnemyView::from_snapshots(vec![enemy(4, 150.0, 200.0), enemy(5, 160.0, 200.0)]);
        let mut out = Vec::new();

        system.handle(
            &towers,
            &enemies,
            &[target(1, 4, WorldPoint::new(150.0, 200.0))],
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::FireVolley {
                tower: TowerId::new(1),
                primary: EnemyId::new(4),
                chained: Vec::new(),
            }]
        );
    }

    #[test]
    fn chains_pick_nearest_victims_within_radius() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![tower(1, TowerKind::Arc, 0.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, 100.0, 100.0),
            enemy(2, 160.0, 100.0),
            enemy(3, 120.0, 100.0),
            enemy(4, 140.0, 100.0),
            enemy(5, 300.0, 100.0),
        ]);
        let mut out = Vec::new();

        system.handle(
            &towers,
            &enemies,
            &[target(1, 1, WorldPoint::new(100.0, 100.0))],
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::FireVolley {
                tower: TowerId::new(1),
                primary: EnemyId::new(1),
                chained: vec![EnemyId::new(3), EnemyId::new(4)],
            }]
        );
    }

    #[test]
    fn cooling_or_missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            tower(3, TowerKind::Pulse, 0.25),
            tower(8, TowerKind::Pulse, 0.0),
        ]);
        let enemies = EnemyView::from_snapshots(vec![enemy(2, 150.0, 200.0)]);
        let position = WorldPoint::new(150.0, 200.0);
        let mut out = Vec::new();

        system.handle(
            &towers,
            &enemies,
            &[target(3, 2, position), target(8, 2, position), target(42, 2, position)],
            &mut out,
        );

        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Command::FireVolley { tower, .. } if tower == TowerId::new(8)
        ));
    }
}
