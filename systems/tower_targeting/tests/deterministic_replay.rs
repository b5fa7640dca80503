use training_defence_core::{
    Command, EnemyKind, Event, GridCoord, TowerKind, TowerTarget, LOGIC_STEP,
};
use training_defence_system_tower_targeting::TowerTargeting;
use training_defence_world::{self as world, query, World};

#[derive(Debug, PartialEq)]
struct Replay {
    assignments: Vec<Vec<TowerTarget>>,
    events: Vec<Event>,
}

fn replay() -> Replay {
    let mut world = World::new();
    let mut system = TowerTargeting::new();
    let mut events = Vec::new();

    for (kind, column, row) in [(TowerKind::Pulse, 2, 2), (TowerKind::Snare, 5, 4)] {
        world::apply(
            &mut world,
            Command::PlaceTower {
                kind,
                cell: GridCoord::new(column, row),
            },
            &mut events,
        );
    }
    world::apply(
        &mut world,
        Command::StartWave {
            queue: vec![EnemyKind::Basic, EnemyKind::Swarm, EnemyKind::Fast],
        },
        &mut events,
    );

    let mut assignments = Vec::new();
    for _ in 0..240 {
        world::apply(&mut world, Command::Tick { dt: LOGIC_STEP }, &mut events);
        let mut targets = Vec::new();
        system.handle(
            &query::tower_view(&world),
            &query::enemy_view(&world),
            &mut targets,
        );
        assignments.push(targets);
        world::apply(&mut world, Command::FinishTick { dt: LOGIC_STEP }, &mut events);
    }

    Replay {
        assignments,
        events,
    }
}

#[test]
fn replay_produces_identical_assignments() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second);
    assert!(first.assignments.iter().any(|targets| !targets.is_empty()));
}

#[test]
fn targets_are_always_within_tower_range() {
    let first = replay();
    let towers = {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Pulse,
                cell: GridCoord::new(2, 2),
            },
            &mut events,
        );
        world::apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Snare,
                cell: GridCoord::new(5, 4),
            },
            &mut events,
        );
        query::tower_view(&world)
    };
    for targets in &first.assignments {
        for target in targets {
            let tower = towers.get(target.tower).expect("known tower");
            let range_sq = tower.stats.range * tower.stats.range;
            assert!(tower.position.distance_sq(target.enemy_position) <= range_sq);
        }
    }
}
