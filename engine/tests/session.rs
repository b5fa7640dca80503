use chrono::NaiveDate;
use training_defence_core::{
    BranchId, EnemyKind, Event, GameSnapshot, GridCoord, MapId, Rejection, TowerKind,
    STARTING_CREDITS,
};
use training_defence_engine::{Engine, FixedCalendar, UpgradeOption};
use training_defence_system_persistence::{LoadOutcome, MemoryStore};

fn engine() -> Engine<MemoryStore, FixedCalendar> {
    let day = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
    Engine::new(MemoryStore::new(), FixedCalendar::new(day))
}

fn import(engine: &mut Engine<MemoryStore, FixedCalendar>, snapshot: &GameSnapshot) {
    let text = serde_json::to_string(snapshot).expect("serialize snapshot");
    assert_eq!(engine.import_snapshot(&text), LoadOutcome::Applied);
}

fn play_out_wave(engine: &mut Engine<MemoryStore, FixedCalendar>) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..6_000 {
        engine.step();
        events.extend_from_slice(engine.last_events());
        if !engine.is_wave_active() {
            break;
        }
    }
    events
}

#[test]
fn fresh_engine_previews_the_first_wave() {
    let engine = engine();
    assert_eq!(engine.credits(), STARTING_CREDITS);
    assert_eq!(engine.status(), "Ready");
    assert_eq!(engine.wave_preview().to_string(), "Next 1: 8 Basic");
}

#[test]
fn rejected_commands_leave_credits_untouched() {
    let mut engine = engine();

    assert_eq!(
        engine.place_tower(TowerKind::Pulse, GridCoord::new(0, 3)),
        Err(Rejection::PathTile)
    );
    assert_eq!(engine.credits(), STARTING_CREDITS);

    engine
        .place_tower(TowerKind::Arc, GridCoord::new(2, 2))
        .expect("arc affordable");
    assert_eq!(engine.credits(), STARTING_CREDITS - 120);

    assert_eq!(
        engine.place_tower(TowerKind::Pulse, GridCoord::new(3, 4)),
        Err(Rejection::InsufficientCredits {
            required: 70,
            available: 20,
        })
    );
    engine.select_tower_at(GridCoord::new(0, 0));
    assert_eq!(engine.upgrade_selected(), Err(Rejection::NoSelection));
    assert_eq!(engine.sell_selected(), Err(Rejection::NoSelection));
    assert_eq!(engine.credits(), 20);
}

#[test]
fn pulse_tower_follows_the_inferno_branch() {
    let mut engine = engine();
    let cell = GridCoord::new(2, 2);
    engine
        .place_tower(TowerKind::Pulse, cell)
        .expect("pulse affordable");
    engine.select_tower_at(cell);

    assert_eq!(engine.upgrade_selected(), Err(Rejection::BranchRequired));
    let summary = engine.selected_summary().expect("tower selected");
    assert!(matches!(summary.next, UpgradeOption::ChooseBranch(_)));

    assert_eq!(
        engine.choose_branch(BranchId::Inferno),
        Err(Rejection::InsufficientCredits {
            required: 112,
            available: 70,
        })
    );
    assert_eq!(engine.credits(), 70);

    let mut snapshot = engine.snapshot();
    snapshot.money = 1_000;
    import(&mut engine, &snapshot);
    engine.select_tower_at(cell);
    engine
        .choose_branch(BranchId::Inferno)
        .expect("branch affordable");
    assert_eq!(engine.credits(), 1_000 - 112);
    engine.upgrade_selected().expect("upgrade affordable");
    assert_eq!(engine.credits(), 1_000 - 112 - 168);

    let summary = engine.selected_summary().expect("tower selected");
    assert_eq!(summary.tower.level, 3);
    assert_eq!(summary.tower.branch, Some(BranchId::Inferno));
    assert!(summary.tower.stats.burn_dps > TowerKind::Pulse.profile().burn_dps);
    assert_eq!(summary.next, UpgradeOption::MaxLevel);
    assert_eq!(engine.upgrade_selected(), Err(Rejection::MaxLevel));
}

#[test]
fn cleared_wave_is_summarized_once() {
    let mut engine = engine();
    engine
        .place_tower(TowerKind::Pulse, GridCoord::new(2, 2))
        .expect("first pulse");
    engine
        .place_tower(TowerKind::Pulse, GridCoord::new(3, 4))
        .expect("second pulse");
    engine.start_wave().expect("wave starts");
    assert_eq!(engine.status(), "Wave 1");

    let events = play_out_wave(&mut engine);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::WaveCleared { wave: 1 })));
    assert_eq!(engine.leaderboard().len(), 1);
    assert_eq!(engine.leaderboard().entries()[0].wave, 1);
    assert_eq!(engine.leaderboard().entries()[0].run_id, engine.run_id());

    assert!(!engine.summarize_wave());
    assert_eq!(engine.leaderboard().len(), 1);
    assert_eq!(engine.wave_preview().to_string(), "Next 2: 10 Basic | 1 Fast");
}

#[test]
fn start_wave_is_refused_while_a_wave_runs() {
    let mut engine = engine();
    engine.start_wave().expect("wave starts");
    assert_eq!(engine.start_wave(), Err(Rejection::WaveActive));
    assert_eq!(engine.wave(), 1);
}

#[test]
fn reaching_a_stage_target_pays_out_and_unlocks_the_next_map() {
    let mut engine = engine();
    assert!(!engine.is_map_unlocked(MapId::Splice));
    assert_eq!(engine.set_map(MapId::Splice), Err(Rejection::MapNotUnlocked));
    assert_eq!(engine.status(), "Map locked");

    let snapshot = GameSnapshot {
        wave: 5,
        wave_active: true,
        ..GameSnapshot::default()
    };
    import(&mut engine, &snapshot);
    engine.step();

    assert_eq!(engine.status(), "Stage 1 complete");
    assert_eq!(engine.credits(), STARTING_CREDITS + 60);
    assert_eq!(engine.lives(), 22);
    assert_eq!(engine.campaign().stage_index(), 1);
    assert!(engine.is_map_unlocked(MapId::Splice));

    engine.set_map(MapId::Splice).expect("splice unlocked");
    assert_eq!(engine.map(), MapId::Splice);
    assert_eq!(engine.wave(), 0);
    assert_eq!(engine.credits(), STARTING_CREDITS);
}

#[test]
fn last_breach_ends_the_run() {
    let mut engine = engine();
    let raw = r#"{
        "version": 3,
        "money": 40,
        "lives": 1,
        "wave": 3,
        "waveActive": true,
        "enemies": [{ "type": "fast", "x": 688, "y": 390, "hp": 30, "pathIndex": 5 }]
    }"#;
    assert_eq!(engine.import_snapshot(raw), LoadOutcome::Applied);

    for _ in 0..30 {
        engine.step();
    }
    assert!(engine.is_game_over());
    assert_eq!(engine.status(), "System down");
    assert_eq!(engine.start_wave(), Err(Rejection::SystemDown));
    assert_eq!(engine.leaderboard().entries()[0].wave, 3);

    engine.reset();
    assert!(!engine.is_game_over());
    assert_eq!(engine.lives(), 20);
    assert_eq!(engine.status(), "Ready");
}

#[test]
fn daily_runs_replay_identically() {
    let snapshot = GameSnapshot {
        wave: 6,
        daily_seed: Some("2026-10-18".to_owned()),
        ..GameSnapshot::default()
    };
    let spawned = |snapshot: &GameSnapshot| {
        let mut engine = engine();
        import(&mut engine, snapshot);
        assert_eq!(engine.daily_seed(), snapshot.daily_seed.as_deref());
        engine.start_wave().expect("wave starts");
        let mut kinds = Vec::new();
        for _ in 0..400 {
            engine.step();
            kinds.extend(engine.last_events().iter().filter_map(|event| match event {
                Event::EnemySpawned { kind, .. } => Some(*kind),
                _ => None,
            }));
        }
        kinds
    };

    let first = spawned(&snapshot);
    let second = spawned(&snapshot);
    assert!(first.len() > 10);
    assert_eq!(first, second);
    assert!(first.contains(&EnemyKind::Basic));

    let other_day = GameSnapshot {
        daily_seed: Some("2026-10-19".to_owned()),
        ..snapshot.clone()
    };
    assert_ne!(spawned(&other_day), first);
}

#[test]
fn daily_mode_requires_a_clear_field() {
    let mut engine = engine();
    engine.set_daily_mode(true).expect("field is clear");
    assert_eq!(engine.daily_seed(), Some("2026-10-18"));
    assert_eq!(engine.status(), "Daily 2026-10-18");

    engine.start_wave().expect("wave starts");
    assert_eq!(engine.set_daily_mode(false), Err(Rejection::FieldNotClear));
    assert_eq!(engine.daily_seed(), Some("2026-10-18"));
}

#[test]
fn pause_freezes_the_simulation() {
    let mut engine = engine();
    engine.start_wave().expect("wave starts");
    engine.toggle_pause();
    assert!(engine.is_paused());
    assert_eq!(engine.status(), "Paused");

    for _ in 0..60 {
        engine.step();
    }
    assert!(engine.enemy_view().is_empty());

    engine.toggle_pause();
    assert_eq!(engine.status(), "Wave 1");
}

#[test]
fn fifth_wave_brings_exactly_one_boss() {
    let mut engine = engine();
    let snapshot = GameSnapshot {
        wave: 4,
        ..GameSnapshot::default()
    };
    import(&mut engine, &snapshot);
    assert_eq!(
        engine.wave_preview().stats.count(EnemyKind::Boss),
        1,
        "preview of wave 5"
    );

    engine.start_wave().expect("wave starts");
    let mut bosses = 0;
    for _ in 0..900 {
        engine.step();
        bosses += engine
            .last_events()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::EnemySpawned {
                        kind: EnemyKind::Boss,
                        ..
                    }
                )
            })
            .count();
    }
    assert_eq!(bosses, 1);
}

#[test]
fn second_tower_retargets_after_the_first_kills() {
    let mut engine = engine();
    let raw = r#"{
        "version": 3,
        "wave": 2,
        "waveActive": true,
        "towers": [
            { "type": "pulse", "gridX": 3, "gridY": 2 },
            { "type": "pulse", "gridX": 5, "gridY": 2 }
        ],
        "enemies": [
            { "type": "basic", "x": 270, "y": 130, "hp": 5, "pathIndex": 2 },
            { "type": "basic", "x": 270, "y": 180, "hp": 40, "pathIndex": 2 }
        ]
    }"#;
    assert_eq!(engine.import_snapshot(raw), LoadOutcome::Applied);

    engine.step();
    let volleys = engine
        .last_events()
        .iter()
        .filter(|event| matches!(event, Event::VolleyFired { .. }))
        .count();
    assert_eq!(volleys, 2);

    let survivors = engine.enemy_view().into_vec();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].hp, 30.0);
}

#[test]
fn lost_daily_run_reaches_only_the_global_board() {
    let mut engine = engine();
    let raw = r#"{
        "version": 3,
        "lives": 1,
        "wave": 4,
        "waveActive": true,
        "dailySeed": "2026-10-18",
        "enemies": [{ "type": "fast", "x": 688, "y": 390, "hp": 30, "pathIndex": 5 }]
    }"#;
    assert_eq!(engine.import_snapshot(raw), LoadOutcome::Applied);

    for _ in 0..30 {
        engine.step();
    }
    assert!(engine.is_game_over());
    assert_eq!(engine.leaderboard().len(), 1);
    assert_eq!(engine.leaderboard().entries()[0].wave, 4);
    assert!(engine.daily_leaderboard().is_none());
    assert_eq!(engine.daily_record().streak(), 0);
}

#[test]
fn render_views_follow_the_run() {
    let mut engine = engine();
    assert_eq!(engine.path().map(), MapId::Core);
    assert_eq!(engine.path().tiles().count(), 19);
    assert!(engine.shots().is_empty());

    engine
        .place_tower(TowerKind::Pulse, GridCoord::new(2, 2))
        .expect("pulse affordable");
    engine.start_wave().expect("wave starts");
    let mut fired = false;
    for _ in 0..300 {
        engine.step();
        if engine
            .last_events()
            .iter()
            .any(|event| matches!(event, Event::VolleyFired { .. }))
        {
            fired = true;
            break;
        }
    }
    assert!(fired);
    assert_eq!(engine.tower_view().len(), 1);
    assert!(!engine.shots().is_empty());
    assert_eq!(engine.shots()[0].color, TowerKind::Pulse.profile().color);
}
