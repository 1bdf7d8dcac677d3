//! Building blueprints
//!
//! Buildings are constructed one at a time per settlement. An upgrade
//! replaces its predecessor instead of stacking with it.

use serde::{Deserialize, Serialize};

/// Types of buildings available
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Tent,
    Hut,
}

impl BuildingKind {
    pub fn all() -> &'static [BuildingKind] {
        &[BuildingKind::Tent, BuildingKind::Hut]
    }

    pub fn id(&self) -> &'static str {
        match self {
            BuildingKind::Tent => "tent",
            BuildingKind::Hut => "hut",
        }
    }

    pub fn from_id(id: &str) -> Option<BuildingKind> {
        BuildingKind::all().iter().copied().find(|kind| kind.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildingKind::Tent => "Tent",
            BuildingKind::Hut => "Wooden Hut",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuildingKind::Tent => "Basic shelter.",
            BuildingKind::Hut => "Sturdy dwelling. Replaces the tent.",
        }
    }

    pub fn cost_materials(&self) -> u32 {
        match self {
            BuildingKind::Tent => 10,
            BuildingKind::Hut => 40,
        }
    }

    /// Construction time in turns.
    pub fn build_time(&self) -> u32 {
        match self {
            BuildingKind::Tent => 2,
            BuildingKind::Hut => 4,
        }
    }

    /// Extra population capacity granted while built.
    pub fn housing(&self) -> u32 {
        match self {
            BuildingKind::Tent => 2,
            BuildingKind::Hut => 5,
        }
    }

    /// The building this one replaces, if it is an upgrade.
    pub fn upgrade_from(&self) -> Option<BuildingKind> {
        match self {
            BuildingKind::Tent => None,
            BuildingKind::Hut => Some(BuildingKind::Tent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for kind in BuildingKind::all() {
            assert_eq!(BuildingKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(BuildingKind::from_id("granary"), None);
    }

    #[test]
    fn test_upgrade_chain() {
        assert_eq!(BuildingKind::Hut.upgrade_from(), Some(BuildingKind::Tent));
        assert!(BuildingKind::Tent.upgrade_from().is_none());
        assert!(BuildingKind::Hut.housing() > BuildingKind::Tent.housing());
    }
}
