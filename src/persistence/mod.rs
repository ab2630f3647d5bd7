//! Save/load of career progress
//!
//! Features:
//! - Versioned JSON envelope (`{ "version", "state" }`)
//! - Migration of legacy Abstract-only saves
//! - Memory and file backends (file writes go tmp → rename)
//!
//! Only long-lived progress is stored. Session fields (vectors, the loaded
//! level, module state, attempts) are always rebuilt by loading a level.

pub mod envelope;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::{CareerProgress, ModuleUnlocks};
use crate::sim::GameModule;

pub use envelope::{SAVE_VERSION, STORAGE_KEY, decode, encode};
pub use store::{FileStore, MemoryStore, ProgressStore};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Unsupported save version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// The persisted blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// Legacy: Abstract unlock index
    pub unlocked_level_index: usize,
    /// Legacy: Abstract stars per level
    pub stars_per_level: BTreeMap<usize, u32>,
    pub active_module: GameModule,
    pub module_unlocks: ModuleUnlocks,
    /// Absent in saves written before the module system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_progress: Option<CareerProgress>,
}

impl PersistedState {
    /// Career progress, rebuilt from the legacy fields when missing
    pub fn career(&self) -> CareerProgress {
        let mut career = match &self.career_progress {
            Some(career) => career.clone(),
            None => {
                let mut career = CareerProgress::default();
                let abs = career.module_mut(GameModule::Abstract);
                abs.unlocked_index = self.unlocked_level_index;
                abs.stars_per_level = self.stars_per_level.clone();
                if !self.stars_per_level.is_empty() {
                    log::info!(
                        "Migrated legacy save ({} abstract levels)",
                        self.stars_per_level.len()
                    );
                }
                career
            }
        };
        career.normalize();
        career
    }
}
