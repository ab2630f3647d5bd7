//! Level catalog
//!
//! Read-only registry of levels per module, loaded from JSON. The catalog
//! also owns the module unlock thresholds.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::level::{GameModule, LevelConfig, ModuleLevel};
use crate::consts::{BRIDGE_UNLOCK_INDEX, DRONE_UNLOCK_INDEX, ROBOTICS_UNLOCK_INDEX};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Level {index} listed under {listed} is tagged {tagged}")]
    ModuleMismatch {
        listed: GameModule,
        tagged: GameModule,
        index: usize,
    },

    #[error("Invalid {module} level {index}: {reason}")]
    InvalidLevel {
        module: GameModule,
        index: usize,
        reason: String,
    },
}

/// Abstract unlock index required to open a module
pub fn unlock_threshold(module: GameModule) -> usize {
    match module {
        GameModule::Abstract => 0,
        GameModule::Drone => DRONE_UNLOCK_INDEX,
        GameModule::Bridge => BRIDGE_UNLOCK_INDEX,
        GameModule::Robotics => ROBOTICS_UNLOCK_INDEX,
    }
}

/// Whether a module is open given the Abstract module's unlock index
pub fn should_module_be_unlocked(module: GameModule, abstract_unlocked_index: usize) -> bool {
    abstract_unlocked_index >= unlock_threshold(module)
}

/// Levels for every module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelCatalog {
    levels: BTreeMap<GameModule, Vec<LevelConfig>>,
}

impl LevelCatalog {
    /// Build a catalog from per-module level lists, validating each level
    pub fn new(levels: BTreeMap<GameModule, Vec<LevelConfig>>) -> Result<Self, CatalogError> {
        let catalog = Self { levels };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog document
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: LevelCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::info!(
            "Loaded level catalog: {}",
            GameModule::ALL
                .iter()
                .map(|m| format!("{} {}", catalog.level_count(*m), m))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(catalog)
    }

    /// Load a catalog document from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// All levels of a module (empty if the module has none)
    pub fn levels_for(&self, module: GameModule) -> &[LevelConfig] {
        self.levels.get(&module).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A single level, if the index is in range
    pub fn level(&self, module: GameModule, index: usize) -> Option<&LevelConfig> {
        self.levels_for(module).get(index)
    }

    pub fn level_count(&self, module: GameModule) -> usize {
        self.levels_for(module).len()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (&listed, levels) in &self.levels {
            for (index, level) in levels.iter().enumerate() {
                let tagged = level.module();
                if tagged != listed {
                    return Err(CatalogError::ModuleMismatch {
                        listed,
                        tagged,
                        index,
                    });
                }
                if let Some(reason) = level_problem(level) {
                    return Err(CatalogError::InvalidLevel {
                        module: listed,
                        index,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }
}

/// First structural problem with a level, if any
fn level_problem(level: &LevelConfig) -> Option<String> {
    if !(level.tolerance > 0.0) {
        return Some(format!("tolerance must be positive, got {}", level.tolerance));
    }
    if level.allowed_vectors == 0 {
        return Some("allowedVectors must be at least 1".to_string());
    }
    match &level.kind {
        ModuleLevel::Abstract => None,
        ModuleLevel::Drone(drone) => {
            if drone.battery.max_capacity < 0.0 || drone.battery.drain_per_unit < 0.0 {
                Some("battery values must be non-negative".to_string())
            } else {
                None
            }
        }
        ModuleLevel::Bridge(bridge) => {
            if bridge.budget < 0.0 {
                Some("budget must be non-negative".to_string())
            } else {
                None
            }
        }
        ModuleLevel::Robotics(robotics) => {
            if robotics.joints.is_empty() {
                return Some("robotics levels need at least one joint".to_string());
            }
            robotics
                .joints
                .iter()
                .position(|j| j.min_angle > j.max_angle)
                .map(|i| format!("joint {} has minAngle > maxAngle", i))
        }
    }
}
