//! Unit blueprints — mobile agents trained by settlements

use serde::{Deserialize, Serialize};

/// Recruitment cost, paid up front when the project starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitCost {
    pub food: u32,
    pub materials: u32,
}

/// Baseline stats a fresh unit starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitStats {
    pub move_range: u32,
    pub vision: i32,
    pub hp: i32,
    /// Food eaten per turn.
    pub consumption: u32,
    pub carry_cap: u32,
    pub initial_food: u32,
    pub initial_materials: u32,
    /// How many tiles' worth of food the unit can live off the land.
    pub forage_cap: u32,
}

/// Types of trainable units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Explorer,
    Settler,
}

impl UnitKind {
    pub fn all() -> &'static [UnitKind] {
        &[UnitKind::Explorer, UnitKind::Settler]
    }

    pub fn id(&self) -> &'static str {
        match self {
            UnitKind::Explorer => "explorer",
            UnitKind::Settler => "settler",
        }
    }

    pub fn from_id(id: &str) -> Option<UnitKind> {
        UnitKind::all().iter().copied().find(|kind| kind.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::Explorer => "Explorer",
            UnitKind::Settler => "Settler",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UnitKind::Explorer => "Fast scout unit. Reveals the map.",
            UnitKind::Settler => "Founds a new settlement.",
        }
    }

    pub fn cost(&self) -> UnitCost {
        match self {
            UnitKind::Explorer => UnitCost {
                food: 10,
                materials: 0,
            },
            UnitKind::Settler => UnitCost {
                food: 50,
                materials: 50,
            },
        }
    }

    /// Population consumed when training completes.
    pub fn pop_cost(&self) -> u32 {
        match self {
            UnitKind::Explorer => 1,
            UnitKind::Settler => 5,
        }
    }

    /// Trainer effort needed to finish recruitment.
    pub fn train_time(&self) -> u32 {
        match self {
            UnitKind::Explorer => 2,
            UnitKind::Settler => 5,
        }
    }

    pub fn stats(&self) -> UnitStats {
        match self {
            UnitKind::Explorer => UnitStats {
                move_range: 2,
                vision: 2,
                hp: 10,
                consumption: 1,
                carry_cap: 20,
                initial_food: 10,
                initial_materials: 0,
                forage_cap: 1,
            },
            UnitKind::Settler => UnitStats {
                move_range: 1,
                vision: 1,
                hp: 10,
                consumption: 5,
                carry_cap: 100,
                initial_food: 50,
                initial_materials: 50,
                forage_cap: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for kind in UnitKind::all() {
            assert_eq!(UnitKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(UnitKind::from_id("warrior"), None);
    }

    #[test]
    fn test_settler_is_expensive() {
        let settler = UnitKind::Settler;
        let explorer = UnitKind::Explorer;
        assert!(settler.cost().food > explorer.cost().food);
        assert!(settler.pop_cost() > explorer.pop_cost());
        assert!(settler.stats().consumption > explorer.stats().consumption);
    }
}
