//! Level session orchestration
//!
//! `GameSession` owns everything a play session touches: the loaded level,
//! the player vectors, module state and the persisted career. Gameplay
//! operations never fail; out-of-range requests are logged and ignored.
//!
//! Flow: `load_level` → input (`tick`, `update_vector`, module actions)
//! → `submit_result` → `unlock_next_level` on success → save.

use glam::Vec3;

use crate::badges::{BadgeDef, award_badges};
use crate::consts::SUCCESS_STARS;
use crate::persistence::{PersistedState, ProgressStore};
use crate::progress::{CareerProgress, ModuleUnlocks};
use crate::resultant;
use crate::settings::Settings;
use crate::sim::{
    ArmAction, BridgeState, ControlDelta, DroneState, GameModule, GamePhase, LevelCatalog,
    LevelConfig, ModuleLevel, ModuleState, RoboticsState, SubmitResult, VectorData, VectorPatch,
    Waypoint, apply_control_deltas, clamp_joint_angle, evaluate, forward_kinematics, sample_wind,
};

use std::collections::BTreeMap;

/// Change notifications for UI layers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LevelLoaded { module: GameModule, index: usize },
    VectorsChanged,
    SelectionChanged(Option<u32>),
    /// Drone, bridge or robotics state changed outside a submit
    ModuleStateChanged,
    Submitted(SubmitResult),
    LevelWon { module: GameModule, index: usize, stars: u32 },
    ProgressChanged,
    ModuleChanged(GameModule),
    ModulesUnlocked(Vec<GameModule>),
    BadgeEarned(String),
}

type Subscriber = Box<dyn FnMut(&SessionEvent)>;

/// Input gathered for one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Deltas applied to the selected vector, in order
    pub deltas: Vec<ControlDelta>,
    /// Precision modifier held
    pub precision: bool,
}

impl TickInput {
    pub fn new(deltas: Vec<ControlDelta>) -> Self {
        Self {
            deltas,
            precision: false,
        }
    }
}

/// A play session
pub struct GameSession {
    catalog: LevelCatalog,
    settings: Settings,
    badges: Vec<BadgeDef>,
    store: Option<Box<dyn ProgressStore>>,

    // Persisted
    active_module: GameModule,
    module_unlocks: ModuleUnlocks,
    career: CareerProgress,
    /// Abstract-only mirror kept for older saves
    unlocked_level_index: usize,
    stars_per_level: BTreeMap<usize, u32>,

    // Session only
    current_level_index: usize,
    current_level: Option<LevelConfig>,
    vectors: Vec<VectorData>,
    selected_vector_id: Option<u32>,
    attempts_display: u32,
    phase: GamePhase,
    best_error_this_level: f32,
    module_state: Option<ModuleState>,
    /// Seconds since the level was loaded (drives wind sampling)
    elapsed: f32,

    subscribers: Vec<Subscriber>,
    events: Vec<SessionEvent>,
}

impl GameSession {
    /// Fresh session with no saved progress
    pub fn new(catalog: LevelCatalog) -> Self {
        Self {
            catalog,
            settings: Settings::default(),
            badges: Vec::new(),
            store: None,
            active_module: GameModule::Abstract,
            module_unlocks: ModuleUnlocks::default(),
            career: CareerProgress::default(),
            unlocked_level_index: 0,
            stars_per_level: BTreeMap::new(),
            current_level_index: 0,
            current_level: None,
            vectors: Vec::new(),
            selected_vector_id: None,
            attempts_display: 0,
            phase: GamePhase::Loading,
            best_error_this_level: f32::INFINITY,
            module_state: None,
            elapsed: 0.0,
            subscribers: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Session backed by a store; saved progress is read immediately
    ///
    /// An unreadable save is ignored (fresh progress) and overwritten on the
    /// next unlock.
    pub fn with_storage(catalog: LevelCatalog, store: impl ProgressStore + 'static) -> Self {
        let mut session = Self::new(catalog);
        match store.load() {
            Ok(Some(saved)) => session.restore(saved),
            Ok(None) => log::info!("No saved progress, starting fresh"),
            Err(e) => log::warn!("Ignoring unreadable save: {}", e),
        }
        session.store = Some(Box::new(store));
        session
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable badge awards against the given catalog
    pub fn with_badges(mut self, badges: Vec<BadgeDef>) -> Self {
        self.badges = badges;
        self
    }

    fn restore(&mut self, saved: PersistedState) {
        self.career = saved.career();
        self.unlocked_level_index = saved.unlocked_level_index;
        self.stars_per_level = saved.stars_per_level;
        // Gates are derived from the career, not trusted from the blob
        self.module_unlocks = self.career.module_unlocks();
        self.active_module = if self.module_unlocks.is_unlocked(saved.active_module) {
            saved.active_module
        } else {
            log::warn!("Saved module {} is locked, using abstract", saved.active_module);
            GameModule::Abstract
        };
        log::info!(
            "Restored progress: {} stars, module {}",
            self.career.total_stars,
            self.active_module
        );
    }

    fn persisted_state(&self) -> PersistedState {
        PersistedState {
            unlocked_level_index: self.unlocked_level_index,
            stars_per_level: self.stars_per_level.clone(),
            active_module: self.active_module,
            module_unlocks: self.module_unlocks.clone(),
            career_progress: Some(self.career.clone()),
        }
    }

    fn save(&mut self) {
        let state = self.persisted_state();
        if let Some(store) = self.store.as_mut() {
            match store.save(&state) {
                Ok(()) => log::debug!("Progress saved"),
                Err(e) => log::warn!("Failed to save progress: {}", e),
            }
        }
    }

    // === Events ===

    /// Register a callback invoked for every event
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SessionEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: SessionEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.events.push(event);
    }

    // === Level lifecycle ===

    /// Load a level of the active module
    ///
    /// Out-of-range indices leave the session untouched and return `false`.
    pub fn load_level(&mut self, index: usize) -> bool {
        let Some(level) = self.catalog.level(self.active_module, index).cloned() else {
            log::warn!(
                "No {} level at index {} ({} available)",
                self.active_module,
                index,
                self.catalog.level_count(self.active_module)
            );
            return false;
        };

        self.phase = GamePhase::Loading;
        self.vectors = (0..level.allowed_vectors)
            .map(|i| VectorData::spawn(i as u32 + 1, i))
            .collect();
        self.selected_vector_id = self.vectors.first().map(|v| v.id);
        self.attempts_display = level.max_attempts;
        self.best_error_this_level = f32::INFINITY;
        self.module_state = Some(ModuleState::for_level(&level));
        self.elapsed = 0.0;
        self.current_level_index = index;

        log::info!(
            "Loaded {} level {} \"{}\" ({} vectors)",
            self.active_module,
            index,
            level.title,
            level.allowed_vectors
        );
        self.current_level = Some(level);
        self.phase = GamePhase::Playing;

        self.emit(SessionEvent::LevelLoaded {
            module: self.active_module,
            index,
        });
        self.emit(SessionEvent::VectorsChanged);
        self.emit(SessionEvent::SelectionChanged(self.selected_vector_id));
        true
    }

    /// Reload the current level from scratch
    pub fn reset_level(&mut self) -> bool {
        self.load_level(self.current_level_index)
    }

    /// Advance to the next level; a no-op on the last one
    pub fn next_level(&mut self) -> bool {
        let next = self.current_level_index + 1;
        if next >= self.catalog.level_count(self.active_module) {
            return false;
        }
        self.load_level(next)
    }

    // === Vectors ===

    /// Select a vector by id, or clear the selection; unknown ids are ignored
    pub fn select_vector(&mut self, id: Option<u32>) -> bool {
        if let Some(id) = id
            && !self.vectors.iter().any(|v| v.id == id)
        {
            return false;
        }
        self.selected_vector_id = id;
        self.emit(SessionEvent::SelectionChanged(id));
        true
    }

    /// Move the selection to the next (or previous) vector, wrapping around
    pub fn cycle_selection(&mut self, reverse: bool) {
        let count = self.vectors.len();
        if count == 0 {
            return;
        }
        let current = self
            .selected_vector_id
            .and_then(|id| self.vectors.iter().position(|v| v.id == id));
        let next = match (current, reverse) {
            (None, false) => 0,
            (None, true) => count - 1,
            (Some(i), false) => (i + 1) % count,
            (Some(i), true) => (i + count - 1) % count,
        };
        let id = self.vectors[next].id;
        self.select_vector(Some(id));
    }

    /// Apply a partial update to a vector; locked vectors are left alone
    pub fn update_vector(&mut self, id: u32, patch: &VectorPatch) -> bool {
        let Some(vector) = self.vectors.iter_mut().find(|v| v.id == id) else {
            return false;
        };
        // A patch may still unlock a locked vector
        if vector.is_locked && patch.is_locked != Some(false) {
            log::debug!("Vector {} is locked, update ignored", id);
            return false;
        }
        vector.apply(patch);
        self.emit(SessionEvent::VectorsChanged);
        true
    }

    /// Per-frame update: wind resampling, preview and held controls
    ///
    /// Ignored outside the `Playing` phase.
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.elapsed += dt;

        let mut vectors_changed = false;
        if !input.deltas.is_empty()
            && let Some(id) = self.selected_vector_id
            && let Some(vector) = self.vectors.iter_mut().find(|v| v.id == id && !v.is_locked)
        {
            vector.components = apply_control_deltas(
                vector.components,
                &input.deltas,
                dt,
                input.precision,
                &self.settings,
            );
            vectors_changed = true;
        }

        if let (Some(level), Some(ModuleState::Drone(drone))) =
            (self.current_level.as_ref(), self.module_state.as_mut())
            && let ModuleLevel::Drone(config) = &level.kind
        {
            drone.current_wind = sample_wind(&config.wind, self.elapsed);
            let thrust = resultant(self.vectors.iter().map(|v| v.components));
            drone.trajectory_preview = vec![Vec3::ZERO, thrust + drone.current_wind];
        }

        if vectors_changed {
            self.emit(SessionEvent::VectorsChanged);
        }
    }

    // === Submission and progress ===

    /// Score the current attempt
    ///
    /// `None` when no level is being played (nothing loaded, or already won).
    pub fn submit_result(&mut self) -> Option<SubmitResult> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let level = self.current_level.as_ref()?;
        let state = self.module_state.as_mut()?;

        let result = evaluate(level, &self.vectors, state, self.best_error_this_level);
        self.best_error_this_level = self.best_error_this_level.min(result.magnitude_error);

        log::debug!(
            "Submit {} level {}: error {:.3} success {} near miss {}",
            self.active_module,
            self.current_level_index,
            result.magnitude_error,
            result.success,
            result.is_near_miss
        );

        self.emit(SessionEvent::Submitted(result));

        if result.success {
            self.unlock_next_level(SUCCESS_STARS);
            self.phase = GamePhase::Won;
            self.emit(SessionEvent::LevelWon {
                module: self.active_module,
                index: self.current_level_index,
                stars: SUCCESS_STARS,
            });
        } else {
            // Running out of attempts does not block resubmission
            self.attempts_display = self.attempts_display.saturating_sub(1);
        }

        Some(result)
    }

    /// Record the current level as completed with `stars`, then save
    pub fn unlock_next_level(&mut self, stars: u32) {
        let module = self.active_module;
        let index = self.current_level_index;

        self.career.record_level(module, index, stars);
        if module == GameModule::Abstract {
            self.unlocked_level_index = self.unlocked_level_index.max(index + 1);
            let best = self.stars_per_level.entry(index).or_insert(0);
            *best = (*best).max(stars);
        }
        log::info!(
            "Completed {} level {} with {} stars ({} total)",
            module,
            index,
            stars,
            self.career.total_stars
        );
        self.emit(SessionEvent::ProgressChanged);

        self.check_module_unlocks();

        if !self.badges.is_empty() {
            for id in award_badges(&mut self.career, &self.badges) {
                self.emit(SessionEvent::BadgeEarned(id));
            }
        }

        self.save();
    }

    /// Recompute module gates from Abstract progress; returns newly opened modules
    pub fn check_module_unlocks(&mut self) -> Vec<GameModule> {
        let unlocks = self.career.module_unlocks();
        let opened = unlocks.newly_unlocked(&self.module_unlocks);
        self.module_unlocks = unlocks;

        if !opened.is_empty() {
            for module in &opened {
                log::info!("Module unlocked: {}", module);
            }
            self.emit(SessionEvent::ModulesUnlocked(opened.clone()));
        }
        opened
    }

    /// Switch modules; locked modules are rejected
    ///
    /// The level index resets to 0 and module state is cleared until the
    /// next `load_level`.
    pub fn set_active_module(&mut self, module: GameModule) -> bool {
        self.check_module_unlocks();
        if !self.module_unlocks.is_unlocked(module) {
            log::warn!("Module {} is locked", module);
            return false;
        }

        self.active_module = module;
        self.current_level_index = 0;
        self.current_level = None;
        self.vectors.clear();
        self.selected_vector_id = None;
        self.module_state = None;
        self.phase = GamePhase::Loading;
        log::info!("Switched to module {}", module);

        self.emit(SessionEvent::ModuleChanged(module));
        self.save();
        true
    }

    // === Drone ===

    pub fn set_drone_flying(&mut self, flying: bool) -> bool {
        let Some(drone) = self.module_state.as_mut().and_then(ModuleState::drone_mut) else {
            return false;
        };
        drone.is_flying = flying;
        self.emit(SessionEvent::ModuleStateChanged);
        true
    }

    // === Bridge ===

    /// Place a member with the selected material; returns its id
    pub fn place_member(&mut self, start: Vec3, end: Vec3) -> Option<u32> {
        let id = match (self.current_level.as_ref(), self.module_state.as_mut()) {
            (Some(level), Some(ModuleState::Bridge(state))) => match &level.kind {
                ModuleLevel::Bridge(config) => state.place_member(config, start, end),
                _ => None,
            },
            _ => None,
        }?;
        self.emit(SessionEvent::ModuleStateChanged);
        Some(id)
    }

    pub fn remove_member(&mut self, id: u32) -> bool {
        let removed = match (self.current_level.as_ref(), self.module_state.as_mut()) {
            (Some(level), Some(ModuleState::Bridge(state))) => match &level.kind {
                ModuleLevel::Bridge(config) => state.remove_member(config, id),
                _ => false,
            },
            _ => false,
        };
        if removed {
            self.emit(SessionEvent::ModuleStateChanged);
        }
        removed
    }

    pub fn select_material(&mut self, material_id: &str) -> bool {
        let selected = match (self.current_level.as_ref(), self.module_state.as_mut()) {
            (Some(level), Some(ModuleState::Bridge(state))) => match &level.kind {
                ModuleLevel::Bridge(config) => state.select_material(config, material_id),
                _ => false,
            },
            _ => false,
        };
        if selected {
            self.emit(SessionEvent::ModuleStateChanged);
        }
        selected
    }

    /// Override the tracked construction cost
    pub fn set_bridge_total_cost(&mut self, cost: f32) -> bool {
        let Some(bridge) = self.module_state.as_mut().and_then(ModuleState::bridge_mut) else {
            return false;
        };
        bridge.total_cost = cost;
        self.emit(SessionEvent::ModuleStateChanged);
        true
    }

    // === Robotics ===

    /// Set one joint angle (clamped to its limits) and refresh the end effector
    pub fn update_joint_angle(&mut self, joint_index: usize, angle: f32) -> bool {
        let updated = match (self.current_level.as_ref(), self.module_state.as_mut()) {
            (Some(level), Some(ModuleState::Robotics(state))) => match &level.kind {
                ModuleLevel::Robotics(config) => {
                    match (
                        config.joints.get(joint_index),
                        state.joint_angles.get_mut(joint_index),
                    ) {
                        (Some(joint), Some(stored)) => {
                            *stored = clamp_joint_angle(joint, angle);
                            state.end_effector_position =
                                forward_kinematics(&config.joints, &state.joint_angles);
                            true
                        }
                        _ => false,
                    }
                }
                _ => false,
            },
            _ => false,
        };
        if updated {
            self.emit(SessionEvent::ModuleStateChanged);
        }
        updated
    }

    pub fn set_held_object(&mut self, held: bool) -> bool {
        let Some(robotics) = self.module_state.as_mut().and_then(ModuleState::robotics_mut) else {
            return false;
        };
        robotics.held_object = held;
        self.emit(SessionEvent::ModuleStateChanged);
        true
    }

    /// Move from the pickup phase to the place phase
    pub fn advance_sequence(&mut self) -> bool {
        let Some(robotics) = self.module_state.as_mut().and_then(ModuleState::robotics_mut) else {
            return false;
        };
        if robotics.sequence_step >= 1 {
            return false;
        }
        robotics.sequence_step = 1;
        self.emit(SessionEvent::ModuleStateChanged);
        true
    }

    /// Append the current pose to the programmed sequence
    pub fn record_waypoint(&mut self, action: Option<ArmAction>) -> bool {
        let Some(robotics) = self.module_state.as_mut().and_then(ModuleState::robotics_mut) else {
            return false;
        };
        robotics.programmed_sequence.push(Waypoint {
            joint_angles: robotics.joint_angles.clone(),
            action,
        });
        self.emit(SessionEvent::ModuleStateChanged);
        true
    }

    // === Accessors ===

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_module(&self) -> GameModule {
        self.active_module
    }

    pub fn module_unlocks(&self) -> &ModuleUnlocks {
        &self.module_unlocks
    }

    pub fn career_progress(&self) -> &CareerProgress {
        &self.career
    }

    /// Legacy Abstract unlock index
    pub fn unlocked_level_index(&self) -> usize {
        self.unlocked_level_index
    }

    /// Legacy Abstract stars per level
    pub fn stars_per_level(&self) -> &BTreeMap<usize, u32> {
        &self.stars_per_level
    }

    pub fn level_count(&self) -> usize {
        self.catalog.level_count(self.active_module)
    }

    pub fn current_level_index(&self) -> usize {
        self.current_level_index
    }

    pub fn current_level(&self) -> Option<&LevelConfig> {
        self.current_level.as_ref()
    }

    pub fn vectors(&self) -> &[VectorData] {
        &self.vectors
    }

    pub fn vector(&self, id: u32) -> Option<&VectorData> {
        self.vectors.iter().find(|v| v.id == id)
    }

    pub fn selected_vector_id(&self) -> Option<u32> {
        self.selected_vector_id
    }

    pub fn attempts_display(&self) -> u32 {
        self.attempts_display
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_won(&self) -> bool {
        self.phase == GamePhase::Won
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn best_error_this_level(&self) -> f32 {
        self.best_error_this_level
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn module_state(&self) -> Option<&ModuleState> {
        self.module_state.as_ref()
    }

    pub fn drone_state(&self) -> Option<&DroneState> {
        self.module_state.as_ref().and_then(ModuleState::drone)
    }

    pub fn bridge_state(&self) -> Option<&BridgeState> {
        self.module_state.as_ref().and_then(ModuleState::bridge)
    }

    pub fn robotics_state(&self) -> Option<&RoboticsState> {
        self.module_state.as_ref().and_then(ModuleState::robotics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::ControlAxis;
    use std::cell::RefCell;
    use std::rc::Rc;

    const CATALOG: &str = r#"{
        "abstract": [
            { "id": 1, "module": "abstract", "title": "One", "description": "",
              "targetVector": [5.0, 0.0, 0.0], "allowedVectors": 1, "tolerance": 0.5, "maxAttempts": 2 },
            { "id": 2, "module": "abstract", "title": "Two", "description": "",
              "targetVector": [3.0, 4.0, 0.0], "allowedVectors": 3, "tolerance": 0.5, "maxAttempts": 5 }
        ],
        "drone": [
            { "id": 101, "module": "drone", "title": "Breeze", "description": "",
              "targetVector": [5.0, 2.0, 0.0], "allowedVectors": 1, "tolerance": 0.5, "maxAttempts": 5,
              "wind": { "base": [1.0, 0.0, 0.0], "variance": 0.0 },
              "battery": { "maxCapacity": 100.0, "drainPerUnit": 5.0 },
              "deliveryTargets": [[5.0, 2.0, 0.0]] }
        ]
    }"#;

    fn session() -> GameSession {
        GameSession::new(LevelCatalog::from_json_str(CATALOG).unwrap())
    }

    #[test]
    fn test_nothing_loaded_initially() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::Loading);
        assert!(s.current_level().is_none());
        assert!(s.submit_result().is_none());
    }

    #[test]
    fn test_load_level_spawns_vectors() {
        let mut s = session();
        assert!(s.load_level(1));
        assert_eq!(s.vectors().len(), 3);
        assert_eq!(s.selected_vector_id(), Some(s.vectors()[0].id));
        assert_eq!(s.attempts_display(), 5);
        assert!(s.is_playing());
        assert!(s.best_error_this_level().is_infinite());
        assert!(matches!(s.module_state(), Some(ModuleState::Abstract)));
    }

    #[test]
    fn test_invalid_index_is_noop() {
        let mut s = session();
        s.load_level(1);
        let before = s.vectors().to_vec();
        assert!(!s.load_level(9));
        assert_eq!(s.current_level_index(), 1);
        assert_eq!(s.vectors(), before.as_slice());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut s = session();
        s.load_level(1);
        let fresh = s.vectors().to_vec();
        let id = fresh[1].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(9.0, 9.0, 9.0)));
        s.submit_result();

        assert!(s.reset_level());
        assert_eq!(s.vectors().len(), fresh.len());
        for (a, b) in s.vectors().iter().zip(&fresh) {
            assert_eq!(a.components, b.components);
        }
        assert_eq!(s.attempts_display(), 5);
    }

    #[test]
    fn test_next_level_stops_at_end() {
        let mut s = session();
        s.load_level(0);
        assert!(s.next_level());
        assert_eq!(s.current_level_index(), 1);
        assert!(!s.next_level());
        assert_eq!(s.current_level_index(), 1);
    }

    #[test]
    fn test_attempts_floor_at_zero_and_stay_permissive() {
        let mut s = session();
        s.load_level(0);
        for _ in 0..4 {
            let result = s.submit_result().unwrap();
            assert!(!result.success);
        }
        assert_eq!(s.attempts_display(), 0);

        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(5.0, 0.0, 0.0)));
        assert!(s.submit_result().unwrap().success);
    }

    #[test]
    fn test_win_awards_flat_stars_and_blocks_resubmit() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(5.2, 0.0, 0.0)));

        let result = s.submit_result().unwrap();
        assert!(result.success);
        assert!(s.is_game_won());
        assert_eq!(SUCCESS_STARS, 3);
        assert_eq!(s.career_progress().module(GameModule::Abstract).stars_for(0), 3);
        assert_eq!(s.unlocked_level_index(), 1);
        assert!(s.submit_result().is_none());
    }

    #[test]
    fn test_best_error_tracks_minimum() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(2.0, 0.0, 0.0)));
        s.submit_result();
        s.update_vector(id, &VectorPatch::components(Vec3::new(-5.0, 0.0, 0.0)));
        s.submit_result();
        assert!((s.best_error_this_level() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_best_error_includes_winning_submit() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!s.submit_result().unwrap().success);
        assert!((s.best_error_this_level() - 3.0).abs() < 1e-5);

        s.update_vector(id, &VectorPatch::components(Vec3::new(5.2, 0.0, 0.0)));
        assert!(s.submit_result().unwrap().success);
        assert!(s.is_game_won());
        assert!((s.best_error_this_level() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_best_error_on_first_try_win() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(5.2, 0.0, 0.0)));
        assert!(s.submit_result().unwrap().success);
        assert!((s.best_error_this_level() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_locked_vector_ignores_updates() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        let lock = VectorPatch {
            is_locked: Some(true),
            ..Default::default()
        };
        assert!(s.update_vector(id, &lock));
        assert!(!s.update_vector(id, &VectorPatch::components(Vec3::X)));
        s.tick(&TickInput::new(vec![ControlDelta::grow()]), 1.0);
        assert_eq!(s.vector(id).unwrap().components, Vec3::new(0.0, 0.1, 0.0));
    }

    #[test]
    fn test_cycle_selection_wraps() {
        let mut s = session();
        s.load_level(1);
        let ids: Vec<u32> = s.vectors().iter().map(|v| v.id).collect();

        s.cycle_selection(true);
        assert_eq!(s.selected_vector_id(), Some(ids[2]));
        s.cycle_selection(false);
        assert_eq!(s.selected_vector_id(), Some(ids[0]));

        s.select_vector(None);
        s.cycle_selection(false);
        assert_eq!(s.selected_vector_id(), Some(ids[0]));
        assert!(!s.select_vector(Some(999)));
    }

    #[test]
    fn test_tick_grows_selected_vector() {
        let mut s = session();
        s.load_level(0);
        s.tick(&TickInput::new(vec![ControlDelta::grow()]), 1.0);
        let v = s.vectors()[0].components;
        assert!((v.length() - 2.6).abs() < 1e-4);
        assert!((s.elapsed() - 1.0).abs() < 1e-6);

        s.tick(
            &TickInput::new(vec![ControlDelta::rotate(ControlAxis::Roll, -1.0)]),
            1.0,
        );
        let v = s.vectors()[0].components;
        assert!((v - Vec3::new(2.6, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_tick_ignored_after_win() {
        let mut s = session();
        s.load_level(0);
        let id = s.vectors()[0].id;
        s.update_vector(id, &VectorPatch::components(Vec3::new(5.0, 0.0, 0.0)));
        s.submit_result();
        s.tick(&TickInput::new(vec![ControlDelta::grow()]), 1.0);
        assert_eq!(s.vectors()[0].components, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(s.elapsed(), 0.0);
    }

    #[test]
    fn test_locked_module_rejected() {
        let mut s = session();
        assert!(!s.set_active_module(GameModule::Drone));
        assert_eq!(s.active_module(), GameModule::Abstract);
        assert!(s.set_active_module(GameModule::Abstract));
    }

    #[test]
    fn test_drone_tick_samples_wind_and_preview() {
        let mut career = CareerProgress::default();
        for i in 0..5 {
            career.record_level(GameModule::Abstract, i, 3);
        }
        let store = MemoryStore::with_state(&PersistedState {
            career_progress: Some(career),
            ..Default::default()
        })
        .unwrap();
        let mut s = GameSession::with_storage(LevelCatalog::from_json_str(CATALOG).unwrap(), store);
        assert!(s.set_active_module(GameModule::Drone));
        assert!(s.drone_state().is_none());
        assert!(s.load_level(0));

        s.tick(&TickInput::default(), 0.016);
        let drone = s.drone_state().unwrap();
        assert_eq!(drone.current_wind, Vec3::X);
        assert_eq!(drone.trajectory_preview.len(), 2);
        assert!((drone.trajectory_preview[1] - Vec3::new(1.0, 0.1, 0.0)).length() < 1e-5);
        assert!(s.bridge_state().is_none());

        assert!(s.set_drone_flying(true));
        assert!(s.drone_state().unwrap().is_flying);
        assert!(!s.advance_sequence());
    }

    #[test]
    fn test_events_reach_subscribers_and_queue() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut s = session();
        s.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        s.load_level(0);
        let queued = s.drain_events();
        assert_eq!(
            queued[0],
            SessionEvent::LevelLoaded {
                module: GameModule::Abstract,
                index: 0
            }
        );
        assert_eq!(*seen.borrow(), queued);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_unlock_saves_progress() {
        let store = MemoryStore::new();
        let mut s = GameSession::with_storage(
            LevelCatalog::from_json_str(CATALOG).unwrap(),
            store.clone(),
        );
        s.load_level(0);
        s.unlock_next_level(3);

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.unlocked_level_index, 1);
        assert_eq!(saved.career().total_stars, 3);
    }

    #[test]
    fn test_corrupt_save_starts_fresh() {
        let store = MemoryStore::with_raw("{{{{");
        let s = GameSession::with_storage(LevelCatalog::from_json_str(CATALOG).unwrap(), store);
        assert_eq!(s.career_progress().total_stars, 0);
        assert_eq!(s.active_module(), GameModule::Abstract);
    }
}
