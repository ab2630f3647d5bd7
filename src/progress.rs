//! Career progression
//!
//! Stars and unlock indices per module, plus the cross-module totals.
//! Persisted across sessions; every derived count is recomputed from
//! `stars_per_level` rather than tracked incrementally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::PERFECT_STARS;
use crate::sim::{GameModule, should_module_be_unlocked};

/// Progress within one module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleProgress {
    pub levels_completed: usize,
    pub stars_earned: u32,
    pub perfect_levels: usize,
    /// Highest level index the player may select
    pub unlocked_index: usize,
    /// Best star count per level index (never lowered)
    pub stars_per_level: BTreeMap<usize, u32>,
}

impl ModuleProgress {
    pub const EMPTY: ModuleProgress = ModuleProgress {
        levels_completed: 0,
        stars_earned: 0,
        perfect_levels: 0,
        unlocked_index: 0,
        stars_per_level: BTreeMap::new(),
    };

    /// Merge a completion of `index` worth `stars`
    ///
    /// Stars merge by max, the unlock index only rises.
    pub fn record(&mut self, index: usize, stars: u32) {
        self.unlocked_index = self.unlocked_index.max(index + 1);
        let best = self.stars_per_level.entry(index).or_insert(0);
        *best = (*best).max(stars);
        self.recompute();
    }

    /// Rebuild the derived counts from `stars_per_level`
    pub fn recompute(&mut self) {
        self.stars_earned = self.stars_per_level.values().sum();
        self.levels_completed = self.stars_per_level.len();
        self.perfect_levels = self
            .stars_per_level
            .values()
            .filter(|&&s| s == PERFECT_STARS)
            .count();
    }

    pub fn is_level_unlocked(&self, index: usize) -> bool {
        index <= self.unlocked_index
    }

    pub fn is_level_completed(&self, index: usize) -> bool {
        self.stars_per_level.contains_key(&index)
    }

    pub fn stars_for(&self, index: usize) -> u32 {
        self.stars_per_level.get(&index).copied().unwrap_or(0)
    }
}

static EMPTY_PROGRESS: ModuleProgress = ModuleProgress::EMPTY;

/// Which modules the player may enter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleUnlocks(BTreeMap<GameModule, bool>);

impl Default for ModuleUnlocks {
    fn default() -> Self {
        Self::from_abstract_index(0)
    }
}

impl ModuleUnlocks {
    /// Gate every module on the Abstract module's unlock index
    pub fn from_abstract_index(abstract_unlocked_index: usize) -> Self {
        Self(
            GameModule::ALL
                .iter()
                .map(|&m| (m, should_module_be_unlocked(m, abstract_unlocked_index)))
                .collect(),
        )
    }

    /// Abstract is always open
    pub fn is_unlocked(&self, module: GameModule) -> bool {
        module == GameModule::Abstract || self.0.get(&module).copied().unwrap_or(false)
    }

    /// Modules open in `self` but not in `before`
    pub fn newly_unlocked(&self, before: &ModuleUnlocks) -> Vec<GameModule> {
        GameModule::ALL
            .iter()
            .copied()
            .filter(|&m| self.is_unlocked(m) && !before.is_unlocked(m))
            .collect()
    }
}

/// Cross-module career progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerProgress {
    /// Badge ids, append-only
    #[serde(default)]
    pub earned_badges: Vec<String>,
    /// Sum of every module's `stars_earned`
    #[serde(default)]
    pub total_stars: u32,
    #[serde(default)]
    pub module_progress: BTreeMap<GameModule, ModuleProgress>,
}

impl Default for CareerProgress {
    fn default() -> Self {
        Self {
            earned_badges: Vec::new(),
            total_stars: 0,
            module_progress: GameModule::ALL
                .iter()
                .map(|&m| (m, ModuleProgress::default()))
                .collect(),
        }
    }
}

impl CareerProgress {
    pub fn module(&self, module: GameModule) -> &ModuleProgress {
        self.module_progress
            .get(&module)
            .unwrap_or(&EMPTY_PROGRESS)
    }

    pub fn module_mut(&mut self, module: GameModule) -> &mut ModuleProgress {
        self.module_progress.entry(module).or_default()
    }

    /// Record a completed level and refresh the career total
    pub fn record_level(&mut self, module: GameModule, index: usize, stars: u32) {
        self.module_mut(module).record(index, stars);
        self.recompute_total_stars();
    }

    pub fn recompute_total_stars(&mut self) {
        self.total_stars = self.module_progress.values().map(|p| p.stars_earned).sum();
    }

    /// Current module gates
    pub fn module_unlocks(&self) -> ModuleUnlocks {
        ModuleUnlocks::from_abstract_index(self.module(GameModule::Abstract).unlocked_index)
    }

    pub fn has_badge(&self, id: &str) -> bool {
        self.earned_badges.iter().any(|b| b == id)
    }

    /// Add a badge id unless already earned; returns whether it was new
    pub fn grant_badge(&mut self, id: &str) -> bool {
        if self.has_badge(id) {
            return false;
        }
        self.earned_badges.push(id.to_string());
        true
    }

    /// Repair loaded data: fill missing modules and rebuild derived counts
    pub fn normalize(&mut self) {
        for module in GameModule::ALL {
            self.module_progress.entry(module).or_default();
        }
        for progress in self.module_progress.values_mut() {
            progress.recompute();
        }
        self.recompute_total_stars();
    }
}
