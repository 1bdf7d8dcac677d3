//! Global simulation state and the planning command surface
//!
//! All mutable simulation data lives in one `GameState` value threaded
//! explicitly through the turn resolver and the planning commands; there
//! are no process-wide singletons. Planning commands validate and reject
//! without mutating anything.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::hex::HexCoord;
use crate::pathfinder::find_path;
use crate::registry::UnitKind;
use crate::simulation::log::{ActivityLog, LogCategory, LogEntry, SourcedEntry};
use crate::simulation::settlement::Settlement;
use crate::simulation::unit::Unit;
use crate::worldgen::WorldMap;

/// The tribe can step one hex per turn before it settles down.
const TRIBE_MOVE_RANGE: u32 = 1;

/// Where the simulation sits between turn resolutions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Planning,
    Execution,
}

/// Pre-settlement wandering actor carrying the colony's first stock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tribe {
    pub location: HexCoord,
    pub inventory: TribeInventory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeInventory {
    pub food: u32,
    pub materials: u32,
}

impl Tribe {
    pub fn new(location: HexCoord) -> Self {
        Tribe {
            location,
            inventory: TribeInventory {
                food: 50,
                materials: 50,
            },
        }
    }
}

/// Queued intents consumed by the next `process_turn`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingActions {
    #[serde(default)]
    pub tribe_move: Option<HexCoord>,
    #[serde(default)]
    pub unit_moves: BTreeMap<usize, HexCoord>,
}

/// Who a planning command is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveTarget {
    Tribe,
    Unit(usize),
}

/// Synchronous rejection of an invalid command; nothing was mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    UnknownTarget,
    AlreadyThere,
    NoPath,
    OutOfRange { range: u32 },
    TileOccupied,
    NotASettler,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownTarget => write!(f, "no such unit"),
            CommandError::AlreadyThere => write!(f, "already at the destination"),
            CommandError::NoPath => write!(f, "no route to the destination"),
            CommandError::OutOfRange { range } => write!(f, "too far (range: {range})"),
            CommandError::TileOccupied => write!(f, "a settlement already stands there"),
            CommandError::NotASettler => write!(f, "only the tribe or a settler can found a settlement"),
        }
    }
}

impl std::error::Error for CommandError {}

/// The whole mutable simulation state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default = "default_turn")]
    pub turn: u32,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default, deserialize_with = "lenient_settlements")]
    pub settlements: Vec<Settlement>,
    #[serde(default, deserialize_with = "lenient_units")]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub tribe: Option<Tribe>,
    #[serde(default)]
    pub pending: PendingActions,
    /// Fog-of-war memory; grows monotonically, serialized as a sorted
    /// list.
    #[serde(default)]
    pub discovered: BTreeSet<HexCoord>,
    #[serde(default)]
    pub activity_log: ActivityLog,
}

fn default_turn() -> u32 {
    1
}

/// Drop unreadable settlements instead of failing the load.
fn lenient_settlements<'de, D>(deserializer: D) -> Result<Vec<Settlement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer).unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Drop units with unknown types, defaulting missing stats from the
/// blueprint.
fn lenient_units<'de, D>(deserializer: D) -> Result<Vec<Unit>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer).unwrap_or_default();
    Ok(values.iter().filter_map(Unit::from_raw_value).collect())
}

impl GameState {
    /// Fresh pre-settlement state: the tribe stands at the spawn with its
    /// immediate surroundings already discovered.
    pub fn new(spawn: HexCoord) -> Self {
        let mut discovered = BTreeSet::new();
        discovered.insert(spawn);
        for neighbor in spawn.neighbors() {
            discovered.insert(neighbor);
        }

        GameState {
            turn: 1,
            phase: Phase::Planning,
            settlements: Vec::new(),
            units: Vec::new(),
            tribe: Some(Tribe::new(spawn)),
            pending: PendingActions::default(),
            discovered,
            activity_log: ActivityLog::new(),
        }
    }

    pub fn settlement_at(&self, coord: HexCoord) -> Option<&Settlement> {
        self.settlements.iter().find(|town| town.location == coord)
    }

    // =====================================================================
    //  Planning commands
    // =====================================================================

    fn target_position(&self, target: MoveTarget) -> Option<HexCoord> {
        match target {
            MoveTarget::Tribe => self.tribe.as_ref().map(|t| t.location),
            MoveTarget::Unit(index) => self.units.get(index).map(|u| u.location),
        }
    }

    fn target_range(&self, target: MoveTarget) -> u32 {
        match target {
            MoveTarget::Tribe => TRIBE_MOVE_RANGE,
            MoveTarget::Unit(index) => self
                .units
                .get(index)
                .map(|u| u.moves_left)
                .unwrap_or(0),
        }
    }

    /// Queue a move for the next turn. The path and range are validated
    /// now; resolution later teleports without re-checking.
    pub fn plan_move(
        &mut self,
        target: MoveTarget,
        dest: HexCoord,
        world: &WorldMap,
    ) -> Result<(), CommandError> {
        let position = self.target_position(target).ok_or(CommandError::UnknownTarget)?;
        if position == dest {
            return Err(CommandError::AlreadyThere);
        }

        let path = find_path(position, dest, world);
        if path.is_empty() {
            return Err(CommandError::NoPath);
        }

        let range = self.target_range(target);
        let steps = (path.len() - 1) as u32;
        if steps > range {
            return Err(CommandError::OutOfRange { range });
        }

        match target {
            MoveTarget::Tribe => self.pending.tribe_move = Some(dest),
            MoveTarget::Unit(index) => {
                self.pending.unit_moves.insert(index, dest);
            }
        }
        Ok(())
    }

    /// Withdraw a queued move.
    pub fn cancel_move(&mut self, target: MoveTarget) {
        match target {
            MoveTarget::Tribe => self.pending.tribe_move = None,
            MoveTarget::Unit(index) => {
                self.pending.unit_moves.remove(&index);
            }
        }
    }

    /// Found a settlement where the tribe or a settler unit stands. The
    /// tribe transfers its stock into the new settlement and retires; a
    /// settler is consumed. Returns the new settlement's index.
    pub fn found_settlement(
        &mut self,
        target: MoveTarget,
        name: impl Into<String>,
        world: &WorldMap,
    ) -> Result<usize, CommandError> {
        let position = self.target_position(target).ok_or(CommandError::UnknownTarget)?;
        if self.settlement_at(position).is_some() {
            return Err(CommandError::TileOccupied);
        }

        let mut town = Settlement::founded(name, position, world);
        match target {
            MoveTarget::Tribe => {
                let tribe = self.tribe.take().expect("target_position checked the tribe");
                town.inventory.food += tribe.inventory.food;
                town.inventory.materials += tribe.inventory.materials;
                self.pending.tribe_move = None;
            }
            MoveTarget::Unit(index) => {
                if self.units[index].kind != UnitKind::Settler {
                    return Err(CommandError::NotASettler);
                }
                self.units.remove(index);
                self.pending.unit_moves.remove(&index);
            }
        }

        self.settlements.push(town);
        Ok(self.settlements.len() - 1)
    }

    // =====================================================================
    //  Plan preview
    // =====================================================================

    /// Speculative view of the next turn: settlement projections plus
    /// per-unit movement and metabolism predictions. Pure.
    pub fn planned_events(&self, world: &WorldMap) -> Vec<SourcedEntry> {
        let mut events = Vec::new();

        for town in &self.settlements {
            for entry in town.planned_events() {
                events.push(SourcedEntry::new(town.name.clone(), entry));
            }
        }

        if let Some(dest) = self.pending.tribe_move {
            events.push(SourcedEntry::new(
                "Tribe",
                LogEntry::new(LogCategory::Move, format!("Migration to {dest}")),
            ));
        }

        for (index, unit) in self.units.iter().enumerate() {
            let stats = unit.kind.stats();
            let move_dest = self.pending.unit_moves.get(&index).copied();

            if let Some(dest) = move_dest {
                events.push(SourcedEntry::new(
                    unit.kind.id(),
                    LogEntry::new(LogCategory::Move, format!("Moving to {dest}")),
                ));
            }

            let final_pos = move_dest.unwrap_or(unit.location);
            let foraged = predict_forage(final_pos, stats.forage_cap, stats.consumption, world);
            let net = foraged as i64 - stats.consumption as i64;

            if net < 0 {
                if (unit.inventory.food as i64) + net < 0 {
                    events.push(SourcedEntry::new(
                        unit.kind.id(),
                        LogEntry::new(LogCategory::Warning, "Starvation risk (rations will run out)"),
                    ));
                } else {
                    events.push(SourcedEntry::new(
                        unit.kind.id(),
                        LogEntry::new(LogCategory::Consumption, format!("Eating rations ({net} Food)")),
                    ));
                }
            } else {
                events.push(SourcedEntry::new(
                    unit.kind.id(),
                    LogEntry::new(LogCategory::Production, "Sustainable (foraging matches needs)"),
                ));
            }
        }

        events
    }

    // =====================================================================
    //  Load hydration
    // =====================================================================

    /// Make a freshly deserialized state internally consistent: default
    /// missing settlement fields, rescan job caps against the loaded
    /// world, and clear stale pending actions.
    pub fn hydrate(&mut self, world: &WorldMap) -> Vec<String> {
        let mut warnings = Vec::new();
        for town in &mut self.settlements {
            town.hydrate(world, &mut warnings);
        }
        self.pending = PendingActions::default();
        self.phase = Phase::Planning;
        warnings
    }
}

/// How much a unit standing at `position` would forage this turn.
/// Foraging can only offset need, never net-produce.
pub fn predict_forage(
    position: HexCoord,
    forage_cap: u32,
    consumption: u32,
    world: &WorldMap,
) -> u32 {
    if forage_cap == 0 {
        return 0;
    }

    let mut candidates = vec![position];
    if forage_cap > 1 {
        candidates.extend(position.neighbors());
    }

    let valid_tiles = candidates
        .into_iter()
        .filter(|coord| {
            world
                .get(*coord)
                .map(|tile| tile.kind.is_forageable())
                .unwrap_or(false)
        })
        .count() as u32;

    valid_tiles.min(forage_cap).min(consumption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::{TerrainKind, Tile};

    fn tile(q: i32, r: i32, kind: TerrainKind) -> Tile {
        Tile {
            q,
            r,
            kind,
            elevation: 0.2,
            moisture: 0.25,
            is_explored: false,
        }
    }

    fn flat_world(radius: i32, kind: TerrainKind) -> WorldMap {
        let mut world = WorldMap::new();
        for coord in HexCoord::new(0, 0).hexes_in_range(radius) {
            world.insert(tile(coord.q, coord.r, kind));
        }
        world
    }

    #[test]
    fn test_new_state_discovers_spawn_surroundings() {
        let state = GameState::new(HexCoord::new(2, 2));
        assert_eq!(state.turn, 1);
        assert_eq!(state.discovered.len(), 7);
        assert!(state.discovered.contains(&HexCoord::new(2, 2)));
        assert!(state.tribe.is_some());
    }

    #[test]
    fn test_plan_move_range_check() {
        let world = flat_world(5, TerrainKind::Plains);
        let mut state = GameState::new(HexCoord::new(0, 0));
        state.units.push(Unit::recruit(UnitKind::Explorer, HexCoord::new(0, 0)));

        // Explorer has 2 moves: distance 2 is fine, 3 is out of range.
        assert!(state
            .plan_move(MoveTarget::Unit(0), HexCoord::new(2, 0), &world)
            .is_ok());
        assert_eq!(
            state.plan_move(MoveTarget::Unit(0), HexCoord::new(3, 0), &world),
            Err(CommandError::OutOfRange { range: 2 })
        );
        assert_eq!(
            state.pending.unit_moves.get(&0),
            Some(&HexCoord::new(2, 0)),
            "rejected command left the accepted plan untouched"
        );
    }

    #[test]
    fn test_plan_move_rejects_unreachable() {
        let mut world = flat_world(3, TerrainKind::Plains);
        let island = HexCoord::new(1, 0);
        for neighbor in island.neighbors() {
            world.insert(tile(neighbor.q, neighbor.r, TerrainKind::Water));
        }

        let mut state = GameState::new(HexCoord::new(-2, 0));
        assert_eq!(
            state.plan_move(MoveTarget::Tribe, island, &world),
            Err(CommandError::NoPath)
        );
        assert!(state.pending.tribe_move.is_none());
    }

    #[test]
    fn test_tribe_founding_transfers_stock() {
        let world = flat_world(3, TerrainKind::Grassland);
        let mut state = GameState::new(HexCoord::new(0, 0));

        let index = state
            .found_settlement(MoveTarget::Tribe, "New Outpost", &world)
            .expect("founding succeeds");
        let town = &state.settlements[index];

        assert_eq!(town.population, 5);
        assert_eq!(town.inventory.food, 100, "50 base + 50 from the tribe");
        assert_eq!(town.inventory.materials, 100);
        assert!(state.tribe.is_none(), "the tribe settled down");
        // Radius-1 scan: six grassland neighbors feed the forager cap.
        assert_eq!(town.job_cap[&crate::registry::JobKind::Forager], 6);
    }

    #[test]
    fn test_settling_twice_rejected() {
        let world = flat_world(3, TerrainKind::Grassland);
        let mut state = GameState::new(HexCoord::new(0, 0));
        state
            .found_settlement(MoveTarget::Tribe, "First", &world)
            .unwrap();

        state
            .units
            .push(Unit::recruit(UnitKind::Settler, HexCoord::new(0, 0)));
        assert_eq!(
            state.found_settlement(MoveTarget::Unit(0), "Second", &world),
            Err(CommandError::TileOccupied)
        );
        assert_eq!(state.units.len(), 1, "settler not consumed");
    }

    #[test]
    fn test_only_settlers_found() {
        let world = flat_world(3, TerrainKind::Grassland);
        let mut state = GameState::new(HexCoord::new(0, 0));
        state.tribe = None;
        state
            .units
            .push(Unit::recruit(UnitKind::Explorer, HexCoord::new(1, 0)));

        assert_eq!(
            state.found_settlement(MoveTarget::Unit(0), "Camp", &world),
            Err(CommandError::NotASettler)
        );
        assert_eq!(
            state.found_settlement(MoveTarget::Tribe, "Camp", &world),
            Err(CommandError::UnknownTarget)
        );
    }

    #[test]
    fn test_settler_founding_consumes_unit() {
        let world = flat_world(3, TerrainKind::Grassland);
        let mut state = GameState::new(HexCoord::new(0, 0));
        state.tribe = None;
        state
            .units
            .push(Unit::recruit(UnitKind::Settler, HexCoord::new(1, 1)));

        let index = state
            .found_settlement(MoveTarget::Unit(0), "Outpost", &world)
            .unwrap();
        assert!(state.units.is_empty());
        assert_eq!(state.settlements[index].inventory.food, 50, "no tribe bonus");
    }

    #[test]
    fn test_predict_forage_caps() {
        let world = flat_world(2, TerrainKind::Grassland);
        let center = HexCoord::new(0, 0);

        // Cap 1 only checks the current tile.
        assert_eq!(predict_forage(center, 1, 5, &world), 1);
        // Cap 5 checks neighbors too, but never exceeds consumption.
        assert_eq!(predict_forage(center, 5, 5, &world), 5);
        assert_eq!(predict_forage(center, 5, 3, &world), 3);
        assert_eq!(predict_forage(center, 0, 5, &world), 0);

        let barren = flat_world(2, TerrainKind::Sand);
        assert_eq!(predict_forage(center, 5, 5, &barren), 0);
    }

    #[test]
    fn test_planned_events_include_units_and_settlements() {
        let world = flat_world(3, TerrainKind::Grassland);
        let mut state = GameState::new(HexCoord::new(0, 0));
        state.found_settlement(MoveTarget::Tribe, "Town", &world).unwrap();
        state
            .units
            .push(Unit::recruit(UnitKind::Explorer, HexCoord::new(1, 0)));
        state
            .plan_move(MoveTarget::Unit(0), HexCoord::new(2, 0), &world)
            .unwrap();

        let events = state.planned_events(&world);
        assert!(events.iter().any(|e| e.source == "Town"));
        assert!(events
            .iter()
            .any(|e| e.source == "explorer" && e.text.starts_with("move|")));
        // Explorer forages 1 on grassland, matching its consumption.
        assert!(events
            .iter()
            .any(|e| e.source == "explorer" && e.text.starts_with("production|Sustainable")));
    }

    #[test]
    fn test_state_survives_lossy_json() {
        let raw = serde_json::json!({
            "turn": 9,
            "settlements": [
                { "name": "Good Town", "location": { "q": 0, "r": 0 } },
                { "location": { "q": 1, "r": 1 } }
            ],
            "units": [
                { "kind": "explorer", "location": { "q": 2, "r": 0 } },
                { "kind": "dragon", "location": { "q": 3, "r": 0 } }
            ]
        });
        let state: GameState = serde_json::from_value(raw).expect("load never fails");
        assert_eq!(state.turn, 9);
        assert_eq!(state.settlements.len(), 1, "nameless settlement dropped");
        assert_eq!(state.units.len(), 1, "unknown unit type dropped");
        assert!(state.discovered.is_empty());
    }
}
