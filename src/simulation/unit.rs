//! Mobile units — explorers, settlers and their carried stock

use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;
use crate::registry::UnitKind;

/// Resources a unit carries with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInventory {
    pub food: u32,
    pub materials: u32,
}

/// A mobile agent on the world map. Spawned by a settlement's finished
/// recruitment project, removed when starvation drains its hp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    pub location: HexCoord,
    pub moves_left: u32,
    pub max_moves: u32,
    pub vision: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub inventory: UnitInventory,
}

impl Unit {
    /// A fresh unit at the given location, stats taken from the
    /// blueprint.
    pub fn recruit(kind: UnitKind, location: HexCoord) -> Self {
        let stats = kind.stats();
        Unit {
            kind,
            location,
            moves_left: stats.move_range,
            max_moves: stats.move_range,
            vision: stats.vision,
            hp: stats.hp,
            max_hp: stats.hp,
            inventory: UnitInventory {
                food: stats.initial_food,
                materials: stats.initial_materials,
            },
        }
    }

    /// Rebuild a unit from raw save data, defaulting any missing field
    /// from the blueprint and refilling `moves_left`. Returns `None` when
    /// the unit type is unknown or the location is unusable.
    pub fn from_raw_value(value: &serde_json::Value) -> Option<Unit> {
        let kind = UnitKind::from_id(value.get("kind")?.as_str()?)?;
        let stats = kind.stats();
        let location: HexCoord = serde_json::from_value(value.get("location")?.clone()).ok()?;

        let field_u32 = |name: &str, fallback: u32| {
            value
                .get(name)
                .and_then(serde_json::Value::as_u64)
                .map(|v| v as u32)
                .unwrap_or(fallback)
        };
        let field_i32 = |name: &str, fallback: i32| {
            value
                .get(name)
                .and_then(serde_json::Value::as_i64)
                .map(|v| v as i32)
                .unwrap_or(fallback)
        };

        let max_moves = field_u32("max_moves", stats.move_range);
        let max_hp = field_i32("max_hp", stats.hp);
        let inventory = value
            .get("inventory")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(UnitInventory {
                food: stats.initial_food,
                materials: stats.initial_materials,
            });

        Some(Unit {
            kind,
            location,
            // Moves refill on load; the planning layer is the only
            // consumer of this budget.
            moves_left: max_moves,
            max_moves,
            vision: field_i32("vision", stats.vision),
            hp: field_i32("hp", stats.hp),
            max_hp,
            inventory,
        })
    }
}
