//! Career badges
//!
//! Badge definitions are external catalog data; this module only decides
//! which ones a career has satisfied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::CareerProgress;
use crate::sim::GameModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
}

/// Thresholds a badge requires; unset fields are not checked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BadgeRequirements {
    pub levels_completed: Option<usize>,
    pub stars_earned: Option<u32>,
    pub perfect_levels: Option<usize>,
    /// Minimum completed levels in each listed module
    pub levels_per_module: BTreeMap<GameModule, usize>,
}

/// A badge definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub module: GameModule,
    pub tier: BadgeTier,
    /// Count requirements against the whole career instead of `module`
    #[serde(default)]
    pub career_wide: bool,
    pub requirements: BadgeRequirements,
}

impl BadgeDef {
    /// Whether `career` meets every requirement of this badge
    pub fn is_satisfied(&self, career: &CareerProgress) -> bool {
        let req = &self.requirements;

        let (levels, stars, perfect) = if self.career_wide {
            let all = career.module_progress.values();
            (
                all.clone().map(|p| p.levels_completed).sum::<usize>(),
                career.total_stars,
                all.map(|p| p.perfect_levels).sum::<usize>(),
            )
        } else {
            let p = career.module(self.module);
            (p.levels_completed, p.stars_earned, p.perfect_levels)
        };

        req.levels_completed.is_none_or(|n| levels >= n)
            && req.stars_earned.is_none_or(|n| stars >= n)
            && req.perfect_levels.is_none_or(|n| perfect >= n)
            && req
                .levels_per_module
                .iter()
                .all(|(&m, &n)| career.module(m).levels_completed >= n)
    }
}

/// Grant every satisfied, not-yet-earned badge; returns the new ids
pub fn award_badges(career: &mut CareerProgress, catalog: &[BadgeDef]) -> Vec<String> {
    let earned: Vec<String> = catalog
        .iter()
        .filter(|b| !career.has_badge(&b.id) && b.is_satisfied(career))
        .map(|b| b.id.clone())
        .collect();

    for id in &earned {
        career.grant_badge(id);
        log::info!("Badge earned: {}", id);
    }
    earned
}
