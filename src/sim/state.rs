//! Session state types
//!
//! Everything here is rebuilt from the level on load and never persisted.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::kinematics::{clamp_joint_angle, forward_kinematics, member_cost};
use super::level::{ArmAction, BridgeLevel, LevelConfig, ModuleLevel};
use crate::consts::{DEFAULT_VECTOR, DEFAULT_VECTOR_COLOR};
use crate::sim::GameModule;

/// Phase of the current level session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No level loaded yet, or state being rebuilt
    Loading,
    /// Accepting input and submissions
    Playing,
    /// Level solved; only next/reset leave this phase
    Won,
}

/// A player-controlled vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    /// Unique within the level session
    pub id: u32,
    pub components: Vec3,
    /// Tail position (origin when absent)
    pub origin: Option<Vec3>,
    pub color: String,
    /// Locked vectors ignore player updates
    pub is_locked: bool,
    pub label: String,
}

impl VectorData {
    /// Fresh vector as spawned on level load (`index` is 0-based)
    pub fn spawn(id: u32, index: usize) -> Self {
        Self {
            id,
            components: Vec3::from_array(DEFAULT_VECTOR),
            origin: None,
            color: DEFAULT_VECTOR_COLOR.to_string(),
            is_locked: false,
            label: format!("v{}", index + 1),
        }
    }

    /// Tail position
    pub fn tail(&self) -> Vec3 {
        self.origin.unwrap_or(Vec3::ZERO)
    }

    /// Head position (tail + components)
    pub fn head(&self) -> Vec3 {
        self.tail() + self.components
    }

    /// Apply a partial update
    pub fn apply(&mut self, patch: &VectorPatch) {
        if let Some(components) = patch.components {
            self.components = components;
        }
        if let Some(origin) = patch.origin {
            self.origin = Some(origin);
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(locked) = patch.is_locked {
            self.is_locked = locked;
        }
    }
}

/// Partial update for a player vector; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorPatch {
    pub components: Option<Vec3>,
    pub origin: Option<Vec3>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub is_locked: Option<bool>,
}

impl VectorPatch {
    pub fn components(components: Vec3) -> Self {
        Self {
            components: Some(components),
            ..Default::default()
        }
    }
}

/// Drone module state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    /// Wind sampled on the latest tick
    pub current_wind: Vec3,
    pub battery_remaining: f32,
    pub deliveries_completed: u32,
    /// Straight-line preview from launch point to thrust + wind
    pub trajectory_preview: Vec<Vec3>,
    pub is_flying: bool,
}

/// A structural member placed by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMember {
    pub id: u32,
    pub start: Vec3,
    pub end: Vec3,
    pub material_id: String,
}

/// A load as currently applied to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedLoad {
    pub position: Vec3,
    pub force: Vec3,
}

/// Bridge module state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeState {
    pub placed_members: Vec<BridgeMember>,
    pub current_loads: Vec<AppliedLoad>,
    pub total_cost: f32,
    /// |supports + loads| from the latest submit (infinite before the first)
    pub equilibrium_error: f32,
    pub selected_material_id: Option<String>,
    next_member_id: u32,
}

impl BridgeState {
    pub fn new(level: &BridgeLevel) -> Self {
        Self {
            placed_members: Vec::new(),
            current_loads: level
                .loads
                .iter()
                .map(|l| AppliedLoad {
                    position: l.position,
                    force: l.force,
                })
                .collect(),
            total_cost: 0.0,
            equilibrium_error: f32::INFINITY,
            selected_material_id: level.materials.first().map(|m| m.id.clone()),
            next_member_id: 1,
        }
    }

    /// Place a member using the selected material
    ///
    /// Returns the new member id, or `None` when no known material is selected.
    pub fn place_member(&mut self, level: &BridgeLevel, start: Vec3, end: Vec3) -> Option<u32> {
        let material_id = self.selected_material_id.clone()?;
        level.material(&material_id)?;

        let id = self.next_member_id;
        self.next_member_id += 1;
        self.placed_members.push(BridgeMember {
            id,
            start,
            end,
            material_id,
        });
        self.recompute_cost(level);
        Some(id)
    }

    /// Remove a member by id; returns whether one was removed
    pub fn remove_member(&mut self, level: &BridgeLevel, id: u32) -> bool {
        let before = self.placed_members.len();
        self.placed_members.retain(|m| m.id != id);
        let removed = self.placed_members.len() != before;
        if removed {
            self.recompute_cost(level);
        }
        removed
    }

    /// Select a material by id; unknown ids are ignored
    pub fn select_material(&mut self, level: &BridgeLevel, id: &str) -> bool {
        if level.material(id).is_some() {
            self.selected_material_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Recompute total cost from the placed members
    pub fn recompute_cost(&mut self, level: &BridgeLevel) {
        self.total_cost = self
            .placed_members
            .iter()
            .filter_map(|m| {
                level
                    .material(&m.material_id)
                    .map(|mat| member_cost(m.start, m.end, mat))
            })
            .sum();
    }
}

/// A recorded arm pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub joint_angles: Vec<f32>,
    pub action: Option<ArmAction>,
}

/// Robotics module state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoboticsState {
    /// One angle per joint, always within that joint's limits
    pub joint_angles: Vec<f32>,
    /// Derived from `joint_angles`; recomputed on every change
    pub end_effector_position: Vec3,
    pub held_object: bool,
    /// 0 = pickup phase, 1 = place phase
    pub sequence_step: usize,
    pub programmed_sequence: Vec<Waypoint>,
}

/// Module-specific session state, matching the active level's module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleState {
    Abstract,
    Drone(DroneState),
    Bridge(BridgeState),
    Robotics(RoboticsState),
}

impl ModuleState {
    /// Initial state for a freshly loaded level
    pub fn for_level(level: &LevelConfig) -> Self {
        match &level.kind {
            ModuleLevel::Abstract => ModuleState::Abstract,
            ModuleLevel::Drone(drone) => ModuleState::Drone(DroneState {
                current_wind: drone.wind.base,
                battery_remaining: drone.battery.max_capacity,
                deliveries_completed: 0,
                trajectory_preview: Vec::new(),
                is_flying: false,
            }),
            ModuleLevel::Bridge(bridge) => ModuleState::Bridge(BridgeState::new(bridge)),
            ModuleLevel::Robotics(robotics) => {
                // Rest pose is 0 rad pulled into each joint's range
                let joint_angles: Vec<f32> = robotics
                    .joints
                    .iter()
                    .map(|joint| clamp_joint_angle(joint, 0.0))
                    .collect();
                let end_effector_position = forward_kinematics(&robotics.joints, &joint_angles);
                ModuleState::Robotics(RoboticsState {
                    joint_angles,
                    end_effector_position,
                    held_object: false,
                    sequence_step: 0,
                    programmed_sequence: Vec::new(),
                })
            }
        }
    }

    pub fn module(&self) -> GameModule {
        match self {
            ModuleState::Abstract => GameModule::Abstract,
            ModuleState::Drone(_) => GameModule::Drone,
            ModuleState::Bridge(_) => GameModule::Bridge,
            ModuleState::Robotics(_) => GameModule::Robotics,
        }
    }

    pub fn drone(&self) -> Option<&DroneState> {
        match self {
            ModuleState::Drone(s) => Some(s),
            _ => None,
        }
    }

    pub fn bridge(&self) -> Option<&BridgeState> {
        match self {
            ModuleState::Bridge(s) => Some(s),
            _ => None,
        }
    }

    pub fn robotics(&self) -> Option<&RoboticsState> {
        match self {
            ModuleState::Robotics(s) => Some(s),
            _ => None,
        }
    }

    pub fn drone_mut(&mut self) -> Option<&mut DroneState> {
        match self {
            ModuleState::Drone(s) => Some(s),
            _ => None,
        }
    }

    pub fn bridge_mut(&mut self) -> Option<&mut BridgeState> {
        match self {
            ModuleState::Bridge(s) => Some(s),
            _ => None,
        }
    }

    pub fn robotics_mut(&mut self) -> Option<&mut RoboticsState> {
        match self {
            ModuleState::Robotics(s) => Some(s),
            _ => None,
        }
    }
}
