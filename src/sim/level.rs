//! Level configuration types
//!
//! A level is read-only catalog data. The module-specific part is a tagged
//! variant so the evaluator can match on it exhaustively.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The four game modules
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameModule {
    #[default]
    Abstract,
    Drone,
    Bridge,
    Robotics,
}

impl GameModule {
    /// All modules in menu order
    pub const ALL: [GameModule; 4] = [
        GameModule::Abstract,
        GameModule::Drone,
        GameModule::Bridge,
        GameModule::Robotics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameModule::Abstract => "abstract",
            GameModule::Drone => "drone",
            GameModule::Bridge => "bridge",
            GameModule::Robotics => "robotics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abstract" => Some(GameModule::Abstract),
            "drone" => Some(GameModule::Drone),
            "bridge" => Some(GameModule::Bridge),
            "robotics" | "robot" => Some(GameModule::Robotics),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short educational blurb shown alongside a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorConcept {
    pub name: String,
    pub brief_description: String,
}

/// A complete level definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub target_vector: Vec3,
    /// Number of player vectors spawned on load
    pub allowed_vectors: usize,
    /// Acceptance radius for the error magnitude
    pub tolerance: f32,
    pub max_attempts: u32,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_concept: Option<VectorConcept>,
    /// Module tag and module-specific fields
    #[serde(flatten)]
    pub kind: ModuleLevel,
}

impl LevelConfig {
    pub fn module(&self) -> GameModule {
        self.kind.module()
    }
}

/// Module-specific level data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "lowercase")]
pub enum ModuleLevel {
    Abstract,
    Drone(DroneLevel),
    Bridge(BridgeLevel),
    Robotics(RoboticsLevel),
}

impl ModuleLevel {
    pub fn module(&self) -> GameModule {
        match self {
            ModuleLevel::Abstract => GameModule::Abstract,
            ModuleLevel::Drone(_) => GameModule::Drone,
            ModuleLevel::Bridge(_) => GameModule::Bridge,
            ModuleLevel::Robotics(_) => GameModule::Robotics,
        }
    }
}

// === Drone ===

/// Wind specification: base vector plus bounded oscillation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindConfig {
    pub base: Vec3,
    pub variance: f32,
    /// How quickly the wind changes (defaults to `DEFAULT_WIND_FREQUENCY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_frequency: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryConfig {
    pub max_capacity: f32,
    /// Energy drained per unit of thrust magnitude
    pub drain_per_unit: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirObstacle {
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingTarget {
    pub start: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Fog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneLevel {
    pub wind: WindConfig,
    pub battery: BatteryConfig,
    /// Waypoints; only the first one is scored
    pub delivery_targets: Vec<Vec3>,
    #[serde(default)]
    pub obstacles: Vec<AirObstacle>,
    #[serde(default)]
    pub moving_targets: Vec<MovingTarget>,
    #[serde(default)]
    pub weather_effects: Weather,
}

// === Bridge ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPattern {
    #[default]
    Constant,
    Oscillating,
    Random,
}

/// An external force applied to the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    pub position: Vec3,
    pub force: Vec3,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub pattern: LoadPattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    pub max_tension: f32,
    pub max_compression: f32,
    pub cost_per_unit: f32,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLevel {
    pub loads: Vec<Load>,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub budget: f32,
    pub safety_factor: f32,
    pub bridge_span: Span,
}

impl BridgeLevel {
    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }
}

// === Robotics ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    #[default]
    Revolute,
    Prismatic,
}

/// One segment of a planar arm (ordered base to tip)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joint {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: JointKind,
    pub min_angle: f32,
    pub max_angle: f32,
    /// Arm segment length
    pub length: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_position: Option<Vec3>,
}

impl Joint {
    /// Whether `angle` lies inside this joint's limits
    pub fn allows(&self, angle: f32) -> bool {
        angle >= self.min_angle && angle <= self.max_angle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxObstacle {
    pub position: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmAction {
    Pick,
    Place,
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoboticsLevel {
    pub joints: Vec<Joint>,
    pub pickup_target: Vec3,
    pub place_target: Vec3,
    #[serde(default)]
    pub obstacles: Vec<BoxObstacle>,
    #[serde(default)]
    pub sequence: Vec<ArmAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_limit: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision_required: Option<f32>,
}

impl RoboticsLevel {
    /// Target for the given sequence step (0 = pickup, anything else = place)
    pub fn target_for_step(&self, step: usize) -> Vec3 {
        if step == 0 {
            self.pickup_target
        } else {
            self.place_target
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_tag_parses() {
        let json = r#"{
            "id": 7,
            "module": "drone",
            "title": "Light Breeze",
            "description": "Compensate for wind",
            "targetVector": [5.0, 2.0, 0.0],
            "allowedVectors": 1,
            "tolerance": 0.5,
            "maxAttempts": 5,
            "wind": { "base": [1.0, 0.0, 0.0], "variance": 0.0 },
            "battery": { "maxCapacity": 100.0, "drainPerUnit": 5.0 },
            "deliveryTargets": [[5.0, 2.0, 0.0]]
        }"#;
        let level: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(level.module(), GameModule::Drone);
        assert!(level.hints.is_empty());
        match level.kind {
            ModuleLevel::Drone(drone) => {
                assert_eq!(drone.wind.base, Vec3::X);
                assert_eq!(drone.wind.noise_frequency, None);
                assert_eq!(drone.weather_effects, Weather::Clear);
            }
            other => panic!("expected drone level, got {:?}", other),
        }
    }

    #[test]
    fn test_abstract_level_parses_without_extensions() {
        let json = r#"{
            "id": 1,
            "module": "abstract",
            "title": "First Steps",
            "description": "Match the target",
            "targetVector": [5.0, 0.0, 0.0],
            "allowedVectors": 1,
            "tolerance": 0.5,
            "maxAttempts": 5,
            "hints": ["Use W to grow"]
        }"#;
        let level: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(level.module(), GameModule::Abstract);
        assert_eq!(level.hints.len(), 1);
    }

    #[test]
    fn test_robotics_target_for_step() {
        let level = RoboticsLevel {
            joints: Vec::new(),
            pickup_target: Vec3::X,
            place_target: Vec3::Y,
            obstacles: Vec::new(),
            sequence: vec![ArmAction::Pick, ArmAction::Place],
            speed_limit: None,
            precision_required: None,
        };
        assert_eq!(level.target_for_step(0), Vec3::X);
        assert_eq!(level.target_for_step(1), Vec3::Y);
        assert_eq!(level.target_for_step(5), Vec3::Y);
    }

    #[test]
    fn test_module_names_round_trip() {
        for module in GameModule::ALL {
            assert_eq!(GameModule::from_str(module.as_str()), Some(module));
        }
        assert_eq!(GameModule::from_str("ROBOT"), Some(GameModule::Robotics));
        assert_eq!(GameModule::from_str("space"), None);
    }
}
