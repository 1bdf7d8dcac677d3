//! Technology categories — skill tracks with increasing level and cost
//!
//! Categories gate the tech tree: a technology can require a minimum
//! level in one or more categories. Every settlement starts each category
//! at level 1, and upgrade cost grows geometrically with level.

use serde::{Deserialize, Serialize};

/// Skill tracks a settlement can level up
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Survival,
    Construction,
    Agriculture,
    Husbandry,
}

impl TechCategory {
    pub fn all() -> &'static [TechCategory] {
        &[
            TechCategory::Survival,
            TechCategory::Construction,
            TechCategory::Agriculture,
            TechCategory::Husbandry,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            TechCategory::Survival => "survival",
            TechCategory::Construction => "construction",
            TechCategory::Agriculture => "agriculture",
            TechCategory::Husbandry => "husbandry",
        }
    }

    pub fn from_id(id: &str) -> Option<TechCategory> {
        TechCategory::all().iter().copied().find(|cat| cat.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TechCategory::Survival => "Survival Skills",
            TechCategory::Construction => "Masonry & Engineering",
            TechCategory::Agriculture => "Farming & Cultivation",
            TechCategory::Husbandry => "Animal Husbandry",
        }
    }

    /// Science cost of the level 1 -> 2 upgrade.
    pub fn base_cost(&self) -> u32 {
        match self {
            TechCategory::Survival => 100,
            TechCategory::Construction => 150,
            TechCategory::Agriculture => 150,
            TechCategory::Husbandry => 150,
        }
    }

    /// Geometric cost growth per level.
    pub fn cost_multiplier(&self) -> f64 {
        1.5
    }

    /// Upgrade cost at the given current level.
    pub fn cost_at_level(&self, level: u32) -> u32 {
        let level = level.max(1);
        (self.base_cost() as f64 * self.cost_multiplier().powi(level as i32 - 1)).floor() as u32
    }
}
