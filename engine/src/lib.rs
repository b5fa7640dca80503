#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Engine instance that owns every piece of mutable Training Defence state.
//!
//! The host submits commands through the methods on [`Engine`] and reads state
//! through its queries. Frame deltas fed to [`Engine::advance`] are converted
//! into fixed logic steps; each step ticks the world, runs targeting and
//! combat, then ages projectiles and evaluates the end of the wave.

mod clock;
mod status;
mod summary;

use std::time::Duration;

use tracing::{debug, info, warn};
use training_defence_core::{
    BranchId, Command, EnemyView, Event, GameSnapshot, GridCoord, MapId, Rejection, Shot,
    TowerKind, TowerView, AUTOSAVE_INTERVAL, LOGIC_STEP,
};
use training_defence_system_persistence::{
    decode_snapshot, encode_snapshot_pretty, KeyValueStore, LoadOutcome, Persistence, SlotId,
    SlotPreview, SnapshotError, CAMPAIGN_KEY, DAILY_KEY, LEADERBOARD_KEY,
};
use training_defence_system_progression::{
    seed_for, Campaign, CampaignProgress, DailyRecord, Leaderboard, LeaderboardEntry,
};
use training_defence_system_tower_combat::TowerCombat;
use training_defence_system_tower_targeting::TowerTargeting;
use training_defence_system_wave_generation::{SeedMode, WaveGeneration, WaveStats};
use training_defence_world::{self as world, query, MapPath, World};

pub use clock::{Calendar, FixedCalendar, FixedStep, SystemCalendar};
pub use summary::{BranchOffer, SelectedSummary, UpgradeOption, WavePreview};

/// Single game instance driven by a host.
#[derive(Debug)]
pub struct Engine<S, C> {
    world: World,
    events: Vec<Event>,
    targeting: TowerTargeting,
    combat: TowerCombat,
    generation: WaveGeneration,
    persistence: Persistence<S>,
    calendar: C,
    clock: FixedStep,
    since_autosave: Duration,
    campaign: Campaign,
    leaderboard: Leaderboard,
    daily: DailyRecord,
    active_slot: SlotId,
    auto_resume: bool,
    run_id: u64,
    summarized_wave: Option<u32>,
    status: String,
}

impl<S: KeyValueStore, C: Calendar> Engine<S, C> {
    /// Boots an engine: progress records and the active slot are restored from
    /// `store`, falling back to a fresh run when nothing usable is stored.
    pub fn new(store: S, calendar: C) -> Self {
        let persistence = Persistence::new(store);
        let campaign = load_or_default(&persistence, CAMPAIGN_KEY);
        let leaderboard = load_or_default(&persistence, LEADERBOARD_KEY);
        let daily = load_or_default(&persistence, DAILY_KEY);
        let active_slot = persistence.active_slot().unwrap_or_else(|error| {
            warn!(%error, "active slot unreadable");
            SlotId::FIRST
        });
        let auto_resume = persistence.auto_resume().unwrap_or_else(|error| {
            warn!(%error, "auto-resume flag unreadable");
            true
        });

        let mut engine = Self {
            world: World::new(),
            events: Vec::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            generation: WaveGeneration::default(),
            persistence,
            calendar,
            clock: FixedStep::new(),
            since_autosave: Duration::ZERO,
            campaign,
            leaderboard,
            daily,
            active_slot,
            auto_resume,
            run_id: 0,
            summarized_wave: None,
            status: status::READY.to_owned(),
        };
        engine.run_id = engine.next_run_id();

        if engine.restore_slot(active_slot) == LoadOutcome::Applied {
            engine.apply_auto_resume();
        }
        engine
    }

    /// Feeds a render-frame delta and runs every logic step that became due.
    ///
    /// Autosaves every [`AUTOSAVE_INTERVAL`] of wall-clock time. Returns the
    /// number of logic steps executed.
    pub fn advance(&mut self, frame_delta: Duration) -> u32 {
        let steps = self.clock.push(frame_delta);
        for _ in 0..steps {
            self.step();
        }

        self.since_autosave += frame_delta;
        if self.since_autosave >= AUTOSAVE_INTERVAL {
            self.since_autosave = Duration::ZERO;
            let _ = self.save();
        }
        steps
    }

    /// Runs a single logic step. Does nothing while paused or after game over.
    pub fn step(&mut self) {
        self.events.clear();
        if query::is_paused(&self.world) || query::is_game_over(&self.world) {
            return;
        }

        world::apply(
            &mut self.world,
            Command::Tick { dt: LOGIC_STEP },
            &mut self.events,
        );

        self.fire_towers();

        world::apply(
            &mut self.world,
            Command::FinishTick { dt: LOGIC_STEP },
            &mut self.events,
        );
        self.absorb_events();
    }

    /// Ready towers fire in id order, each aiming at the enemies still alive
    /// after the volleys before it.
    fn fire_towers(&mut self) {
        let tower_view = query::tower_view(&self.world);
        for tower in tower_view.iter().filter(|tower| tower.is_ready()) {
            let enemy_view = query::enemy_view(&self.world);
            let Some(target) = self.targeting.select(tower, &enemy_view) else {
                continue;
            };
            let volley = self.combat.volley(tower, &enemy_view, &target);
            world::apply(&mut self.world, volley, &mut self.events);
        }
    }

    /// Host became hidden; persists the run.
    pub fn on_hidden(&mut self) -> bool {
        self.save()
    }

    /// Host is about to unload; persists the run.
    pub fn on_unload(&mut self) -> bool {
        self.save()
    }

    /// Builds a tower on a free, non-path tile.
    pub fn place_tower(&mut self, kind: TowerKind, cell: GridCoord) -> Result<(), Rejection> {
        self.submit(Command::PlaceTower { kind, cell })
    }

    /// Selects the tower on a tile, or clears the selection.
    pub fn select_tower_at(&mut self, cell: GridCoord) {
        let _ = self.submit(Command::SelectTowerAt { cell });
    }

    /// Levels the selected tower within its branch.
    pub fn upgrade_selected(&mut self) -> Result<(), Rejection> {
        self.submit(Command::UpgradeSelected)
    }

    /// Commits the selected level-1 tower to a branch.
    pub fn choose_branch(&mut self, branch: BranchId) -> Result<(), Rejection> {
        self.submit(Command::ChooseBranch { branch })
    }

    /// Sells the selected tower.
    pub fn sell_selected(&mut self) -> Result<(), Rejection> {
        self.submit(Command::SellSelected)
    }

    /// Generates the next wave's queue and starts it.
    pub fn start_wave(&mut self) -> Result<(), Rejection> {
        if query::is_game_over(&self.world) {
            return Err(self.reject(Rejection::SystemDown));
        }
        if query::is_wave_active(&self.world) {
            return Err(self.reject(Rejection::WaveActive));
        }
        let wave = query::wave(&self.world).saturating_add(1);
        let queue = self.generation.queue(wave);
        self.submit(Command::StartWave { queue })
    }

    /// Flips the pause flag.
    pub fn toggle_pause(&mut self) {
        let _ = self.submit(Command::TogglePause);
    }

    /// Switches map, which starts a fresh run on it.
    ///
    /// Refused while the field is active or when the campaign has not
    /// unlocked the map yet.
    pub fn set_map(&mut self, map: MapId) -> Result<(), Rejection> {
        if !self.campaign.is_map_unlocked(map) {
            return Err(self.reject(Rejection::MapNotUnlocked));
        }
        self.submit(Command::SetMap { map })?;
        self.begin_run();
        Ok(())
    }

    /// Discards the run, starts over on the current map and clears the
    /// active slot.
    pub fn reset(&mut self) {
        let _ = self.submit(Command::ResetRun);
        self.begin_run();
        if let Err(error) = self.persistence.clear_slot(self.active_slot) {
            warn!(slot = self.active_slot.get(), %error, "slot clear failed");
        }
    }

    /// Enables or disables daily mode; either way a fresh run starts.
    ///
    /// Refused while a wave is live or enemies remain, unless the run is over.
    pub fn set_daily_mode(&mut self, enabled: bool) -> Result<(), Rejection> {
        let field_active =
            query::is_wave_active(&self.world) || !query::enemy_view(&self.world).is_empty();
        if field_active && !query::is_game_over(&self.world) {
            return Err(self.reject(Rejection::FieldNotClear));
        }
        let mode = if enabled {
            SeedMode::Daily(seed_for(self.calendar.today()))
        } else {
            SeedMode::Entropy
        };
        let _ = self.submit(Command::ResetRun);
        self.begin_run();
        self.status = match &mode {
            SeedMode::Daily(seed) => format!("Daily {seed}"),
            SeedMode::Entropy => status::READY.to_owned(),
        };
        info!(daily = enabled, "seed mode changed");
        self.generation.set_mode(mode);
        Ok(())
    }

    /// Persists the auto-resume preference.
    pub fn set_auto_resume(&mut self, enabled: bool) {
        self.auto_resume = enabled;
        self.status = if enabled {
            "Auto resume on"
        } else {
            "Auto resume off"
        }
        .to_owned();
        if let Err(error) = self.persistence.set_auto_resume(enabled) {
            warn!(%error, "auto-resume flag not stored");
        }
    }

    /// Selects the slot used by saves, autosaves and quick loads.
    pub fn set_active_slot(&mut self, slot: SlotId) {
        self.active_slot = slot;
        if let Err(error) = self.persistence.set_active_slot(slot) {
            warn!(%error, "active slot not stored");
        }
    }

    /// Saves the run into the active slot. Failures are logged, never raised.
    pub fn save(&mut self) -> bool {
        self.save_to(self.active_slot)
    }

    /// Saves the run into the provided slot.
    pub fn save_to(&mut self, slot: SlotId) -> bool {
        let snapshot = self.snapshot();
        match self.persistence.save_slot(slot, &snapshot) {
            Ok(()) => true,
            Err(error) => {
                warn!(slot = slot.get(), %error, "save failed");
                false
            }
        }
    }

    /// Explicit save into the active slot.
    pub fn quick_save(&mut self) -> bool {
        let saved = self.save();
        self.status = if saved { "Quick save" } else { "Save failed" }.to_owned();
        saved
    }

    /// Loads a slot, making it the active slot when it applies.
    pub fn load(&mut self, slot: SlotId) -> LoadOutcome {
        let outcome = self.restore_slot(slot);
        match &outcome {
            LoadOutcome::Applied => {
                self.set_active_slot(slot);
                self.status = "Quick load".to_owned();
                self.apply_auto_resume();
            }
            LoadOutcome::Empty => self.status = "No save".to_owned(),
            LoadOutcome::Rejected(_) => self.status = "Load failed".to_owned(),
        }
        outcome
    }

    /// Loads the active slot.
    pub fn quick_load(&mut self) -> LoadOutcome {
        self.load(self.active_slot)
    }

    /// Serialises the current run for a file download.
    pub fn export_snapshot(&self) -> Result<String, SnapshotError> {
        encode_snapshot_pretty(&self.snapshot())
    }

    /// Applies an uploaded snapshot and persists it into the active slot.
    ///
    /// Nothing changes unless the payload carries a supported version and
    /// passes validation.
    pub fn import_snapshot(&mut self, text: &str) -> LoadOutcome {
        let snapshot = match decode_snapshot(text) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "import rejected");
                self.status = "Import failed".to_owned();
                return LoadOutcome::Rejected(error.to_string());
            }
        };
        let outcome = self.apply_snapshot(snapshot);
        if outcome == LoadOutcome::Applied {
            self.status = "Import applied".to_owned();
            let _ = self.save();
        } else {
            self.status = "Import failed".to_owned();
        }
        outcome
    }

    /// Records the end of the current wave exactly once.
    ///
    /// Lost waves reach the global leaderboard; the campaign, daily board and
    /// streak only see cleared ones. Called automatically when a wave clears
    /// or the run ends; repeated calls for the same wave return `false`
    /// without touching any record.
    pub fn summarize_wave(&mut self) -> bool {
        let wave = query::wave(&self.world);
        if wave == 0 || query::is_wave_active(&self.world) {
            return false;
        }
        let cleared = !query::is_game_over(&self.world);
        self.events.clear();
        let summarized = self.summarize(wave, cleared);
        self.absorb_events();
        summarized
    }

    /// Credits held.
    #[must_use]
    pub fn credits(&self) -> u32 {
        query::credits(&self.world)
    }

    /// Lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Wave counter.
    #[must_use]
    pub fn wave(&self) -> u32 {
        query::wave(&self.world)
    }

    /// Enemies killed during the run.
    #[must_use]
    pub fn kills(&self) -> u32 {
        query::kills(&self.world)
    }

    /// Status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether a wave is running.
    #[must_use]
    pub fn is_wave_active(&self) -> bool {
        query::is_wave_active(&self.world)
    }

    /// Whether logic advance is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        query::is_paused(&self.world)
    }

    /// Whether the run ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }

    /// Active map.
    #[must_use]
    pub fn map(&self) -> MapId {
        query::map(&self.world)
    }

    /// Walkable path of the active map.
    #[must_use]
    pub fn path(&self) -> &MapPath {
        query::path(&self.world)
    }

    /// Composition of the running wave, or of the next one between waves.
    #[must_use]
    pub fn wave_preview(&self) -> WavePreview {
        let active = query::is_wave_active(&self.world);
        let wave = query::wave(&self.world);
        let previewed = if active { wave } else { wave.saturating_add(1) };
        WavePreview {
            active,
            stats: WaveStats::for_wave(previewed),
        }
    }

    /// Panel data for the selected tower.
    #[must_use]
    pub fn selected_summary(&self) -> Option<SelectedSummary> {
        query::selected_tower(&self.world)
            .map(|tower| SelectedSummary::new(tower, query::credits(&self.world)))
    }

    /// Towers for rendering.
    #[must_use]
    pub fn tower_view(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Enemies for rendering.
    #[must_use]
    pub fn enemy_view(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Projectile records for rendering.
    #[must_use]
    pub fn shots(&self) -> &[Shot] {
        query::shots(&self.world)
    }

    /// Events produced by the most recent command or logic step.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Campaign position.
    #[must_use]
    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    /// Progress towards the active campaign stage.
    #[must_use]
    pub fn campaign_progress(&self) -> CampaignProgress {
        self.campaign
            .progress(query::map(&self.world), query::wave(&self.world))
    }

    /// Whether the campaign allows selecting a map.
    #[must_use]
    pub fn is_map_unlocked(&self, map: MapId) -> bool {
        self.campaign.is_map_unlocked(map)
    }

    /// Global leaderboard.
    #[must_use]
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Board of the daily seed in play, or of today when not in daily mode.
    #[must_use]
    pub fn daily_leaderboard(&self) -> Option<&Leaderboard> {
        match self.generation.mode().daily() {
            Some(seed) => self.daily.board(seed),
            None => self.daily.board(&seed_for(self.calendar.today())),
        }
    }

    /// Daily record, including the streak.
    #[must_use]
    pub fn daily_record(&self) -> &DailyRecord {
        &self.daily
    }

    /// Daily seed in play, if in daily mode.
    #[must_use]
    pub fn daily_seed(&self) -> Option<&str> {
        self.generation.mode().daily()
    }

    /// Identifier of the current run.
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Slot used by saves and quick loads.
    #[must_use]
    pub fn active_slot(&self) -> SlotId {
        self.active_slot
    }

    /// Whether loads resume live waves automatically.
    #[must_use]
    pub fn auto_resume(&self) -> bool {
        self.auto_resume
    }

    /// Summaries of every save slot.
    pub fn slot_previews(&mut self) -> Vec<(SlotId, SlotPreview)> {
        self.persistence.previews()
    }

    /// Underlying key-value store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        self.persistence.store_mut()
    }

    /// Snapshot of the run as it would be saved now.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            saved_at: self.calendar.now_millis(),
            run_id: self.run_id,
            daily_seed: self.generation.mode().daily().map(str::to_owned),
            ..query::snapshot(&self.world)
        }
    }

    fn submit(&mut self, command: Command) -> Result<(), Rejection> {
        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
        let rejection = self.events.iter().find_map(|event| match event {
            Event::CommandRejected { reason } => Some(*reason),
            _ => None,
        });
        self.absorb_events();
        match rejection {
            Some(reason) => {
                debug!(%reason, "command rejected");
                Err(reason)
            }
            None => Ok(()),
        }
    }

    fn reject(&mut self, reason: Rejection) -> Rejection {
        self.status = status::rejection(reason);
        debug!(%reason, "command rejected");
        reason
    }

    fn absorb_events(&mut self) {
        let mut index = 0;
        while index < self.events.len() {
            let event = self.events[index].clone();
            index += 1;
            if let Some(text) = status::describe(
                &event,
                query::is_wave_active(&self.world),
                query::wave(&self.world),
            ) {
                self.status = text;
            }
            match event {
                Event::WaveCleared { wave } => {
                    let _ = self.summarize(wave, true);
                }
                Event::GameOver { wave } => {
                    let _ = self.summarize(wave, false);
                }
                _ => {}
            }
        }
    }

    /// Every summarized wave, cleared or lost, upserts the run's entry on the
    /// global board. Campaign stages, the daily board and the streak count
    /// cleared waves only, so a daily run that ends in game over stays off the
    /// daily board.
    fn summarize(&mut self, wave: u32, cleared: bool) -> bool {
        if self.summarized_wave == Some(wave) {
            return false;
        }
        self.summarized_wave = Some(wave);

        let entry = LeaderboardEntry {
            run_id: self.run_id,
            wave,
            kills: query::kills(&self.world),
            time: query::run_time(&self.world),
            map: query::map(&self.world),
            recorded_at: self.calendar.now_millis(),
        };
        let _ = self.leaderboard.record(entry.clone());
        info!(wave, cleared, kills = entry.kills, "wave summarized");

        if cleared {
            if let Some(reward) = self.campaign.evaluate(entry.map, wave) {
                self.grant(reward.credits, reward.lives);
                self.status = format!("Stage {} complete", reward.stage);
            }
            if let Some(seed) = self.generation.mode().daily().map(str::to_owned) {
                let outcome = self.daily.complete_run(&seed, self.calendar.today(), entry);
                if outcome.bonus > 0 {
                    self.grant(outcome.bonus, 0);
                    self.status = format!("Streak {} +{}", outcome.streak, outcome.bonus);
                }
            }
        }

        self.store_progress();
        true
    }

    fn grant(&mut self, credits: u32, lives: u32) {
        world::apply(
            &mut self.world,
            Command::GrantReward { credits, lives },
            &mut self.events,
        );
    }

    fn store_progress(&mut self) {
        let results = [
            self.persistence.save_record(CAMPAIGN_KEY, &self.campaign),
            self.persistence.save_record(LEADERBOARD_KEY, &self.leaderboard),
            self.persistence.save_record(DAILY_KEY, &self.daily),
        ];
        for error in results.into_iter().filter_map(Result::err) {
            warn!(%error, "progress not stored");
        }
    }

    fn restore_slot(&mut self, slot: SlotId) -> LoadOutcome {
        match self.persistence.load_slot(slot) {
            Ok(Some(snapshot)) => self.apply_snapshot(snapshot),
            Ok(None) => LoadOutcome::Empty,
            Err(error) => LoadOutcome::Rejected(error.to_string()),
        }
    }

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) -> LoadOutcome {
        let run_id = snapshot.run_id;
        let daily_seed = snapshot.daily_seed.clone();
        let wave_active = snapshot.wave_active;
        let wave = snapshot.wave;
        if let Err(reason) = self.submit(Command::Restore {
            snapshot: Box::new(snapshot),
        }) {
            warn!(%reason, "snapshot rejected");
            return LoadOutcome::Rejected(reason.to_string());
        }

        self.run_id = if run_id == 0 {
            self.next_run_id()
        } else {
            run_id
        };
        self.generation.set_mode(match daily_seed {
            Some(seed) => SeedMode::Daily(seed),
            None => SeedMode::Entropy,
        });
        self.summarized_wave = (!wave_active && wave > 0).then_some(wave);
        self.clock.reset();
        LoadOutcome::Applied
    }

    fn apply_auto_resume(&mut self) {
        if !self.auto_resume || !query::is_paused(&self.world) {
            return;
        }
        let field_active =
            query::is_wave_active(&self.world) || !query::enemy_view(&self.world).is_empty();
        if field_active {
            let _ = self.submit(Command::SetPaused { paused: false });
            self.status = "Auto resume".to_owned();
        }
    }

    fn begin_run(&mut self) {
        self.run_id = self.next_run_id();
        self.summarized_wave = None;
        self.clock.reset();
    }

    fn next_run_id(&self) -> u64 {
        let now = u64::try_from(self.calendar.now_millis()).unwrap_or(0);
        now.max(self.run_id.saturating_add(1))
    }
}

fn load_or_default<S, T>(persistence: &Persistence<S>, key: &'static str) -> T
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned + Default,
{
    persistence.load_record(key).unwrap_or_else(|error| {
        warn!(key, %error, "progress record unreadable");
        T::default()
    })
}
