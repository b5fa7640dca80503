use training_defence_core::{Command, EnemyKind, Event, GridCoord, TowerKind, LOGIC_STEP};
use training_defence_system_tower_combat::TowerCombat;
use training_defence_system_tower_targeting::TowerTargeting;
use training_defence_world::{self as world, query, World};

fn run_wave(towers: &[(TowerKind, u32, u32)], queue: Vec<EnemyKind>) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();

    for &(kind, column, row) in towers {
        world::apply(
            &mut world,
            Command::PlaceTower {
                kind,
                cell: GridCoord::new(column, row),
            },
            &mut events,
        );
    }
    world::apply(&mut world, Command::StartWave { queue }, &mut events);

    let mut targets = Vec::new();
    let mut volleys = Vec::new();
    for _ in 0..3_000 {
        world::apply(&mut world, Command::Tick { dt: LOGIC_STEP }, &mut events);
        let tower_view = query::tower_view(&world);
        let enemy_view = query::enemy_view(&world);
        targeting.handle(&tower_view, &enemy_view, &mut targets);
        combat.handle(&tower_view, &enemy_view, &targets, &mut volleys);
        for volley in volleys.drain(..) {
            world::apply(&mut world, volley, &mut events);
        }
        world::apply(&mut world, Command::FinishTick { dt: LOGIC_STEP }, &mut events);
        if !query::is_wave_active(&world) {
            break;
        }
    }
    (world, events)
}

#[test]
fn arc_tower_chains_through_a_tight_pack() {
    let (world, events) = run_wave(&[(TowerKind::Arc, 2, 2)], vec![EnemyKind::Basic; 6]);

    let multi_hit = events
        .iter()
        .any(|event| matches!(event, Event::VolleyFired { hits, .. } if *hits > 1));
    assert!(multi_hit);
    assert!(query::kills(&world) > 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::WaveCleared { wave: 1 })));
}

#[test]
fn kills_pay_out_exactly_once() {
    let (world, events) = run_wave(
        &[(TowerKind::Pulse, 2, 2), (TowerKind::Pulse, 3, 4)],
        vec![EnemyKind::Basic; 3],
    );

    let rewards: u32 = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyKilled { reward, .. } => Some(*reward),
            _ => None,
        })
        .sum();
    let killed = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { .. }))
        .count();
    assert_eq!(query::kills(&world) as usize, killed);
    assert_eq!(query::credits(&world), rewards);
}
