//! Technology blueprints
//!
//! A tech is paid for in science up front, then incorporated over several
//! turns of innovator labor. `unlocks` lists building ids resolved lazily
//! at use time; an id with no matching building is inert.

use serde::{Deserialize, Serialize};

use crate::registry::tech_categories::TechCategory;

/// Technologies a settlement can incorporate
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechKind {
    #[serde(rename = "tools_stone")]
    StoneTools,
    AgricultureBasic,
    Masonry,
    AnimalHusbandry,
    Pottery,
}

impl TechKind {
    pub fn all() -> &'static [TechKind] {
        &[
            TechKind::StoneTools,
            TechKind::AgricultureBasic,
            TechKind::Masonry,
            TechKind::AnimalHusbandry,
            TechKind::Pottery,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            TechKind::StoneTools => "tools_stone",
            TechKind::AgricultureBasic => "agriculture_basic",
            TechKind::Masonry => "masonry",
            TechKind::AnimalHusbandry => "animal_husbandry",
            TechKind::Pottery => "pottery",
        }
    }

    pub fn from_id(id: &str) -> Option<TechKind> {
        TechKind::all().iter().copied().find(|kind| kind.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TechKind::StoneTools => "Stone Tools",
            TechKind::AgricultureBasic => "Basic Agriculture",
            TechKind::Masonry => "Masonry",
            TechKind::AnimalHusbandry => "Domestication",
            TechKind::Pottery => "Pottery",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TechKind::StoneTools => "Basic stone implements for gathering.",
            TechKind::AgricultureBasic => "The seeds of civilization.",
            TechKind::Masonry => "Building with clay and stone.",
            TechKind::AnimalHusbandry => "Taming wild beasts.",
            TechKind::Pottery => "Vessels for storage and cooking.",
        }
    }

    /// Science paid up front to start the project.
    pub fn cost(&self) -> u32 {
        match self {
            TechKind::StoneTools => 50,
            TechKind::AgricultureBasic => 100,
            TechKind::Masonry => 150,
            TechKind::AnimalHusbandry => 150,
            TechKind::Pottery => 300,
        }
    }

    /// Innovation effort (innovator-turns) to finish incorporation.
    pub fn effort(&self) -> u32 {
        match self {
            TechKind::StoneTools => 50,
            TechKind::AgricultureBasic => 100,
            TechKind::Masonry => 120,
            TechKind::AnimalHusbandry => 120,
            TechKind::Pottery => 200,
        }
    }

    /// Minimum category levels required to start the project.
    pub fn requirements(&self) -> &'static [(TechCategory, u32)] {
        match self {
            TechKind::StoneTools => &[(TechCategory::Survival, 1)],
            TechKind::AgricultureBasic => {
                &[(TechCategory::Survival, 2), (TechCategory::Agriculture, 1)]
            }
            TechKind::Masonry => &[(TechCategory::Construction, 2)],
            TechKind::AnimalHusbandry => {
                &[(TechCategory::Husbandry, 1), (TechCategory::Survival, 2)]
            }
            TechKind::Pottery => {
                &[(TechCategory::Construction, 3), (TechCategory::Agriculture, 2)]
            }
        }
    }

    /// Building ids this tech makes available, resolved at use time.
    pub fn unlocks(&self) -> &'static [&'static str] {
        match self {
            TechKind::StoneTools => &["gatherer_hut"],
            TechKind::AgricultureBasic => &["farm_plot"],
            TechKind::Masonry => &["hut_clay", "storage_pit"],
            TechKind::AnimalHusbandry => &["pasture"],
            TechKind::Pottery => &["granary"],
        }
    }
}
