//! Save store — the file-backed persistence collaborator
//!
//! A save is one pretty-printed JSON file per world: the tile map as
//! `(key, tile)` pairs, the serialized game state, and a timestamp.
//! Loading is defensive: missing or malformed state fields degrade to
//! defaults, warnings are collected for observability, and only I/O or
//! top-level JSON errors surface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::{TechKind, UnitKind};
use crate::simulation::state::GameState;
use crate::worldgen::{Tile, WorldMap};

#[derive(Serialize)]
struct PayloadOut<'a> {
    map_data: Vec<(String, Tile)>,
    state_data: &'a GameState,
    timestamp: DateTime<Utc>,
}

/// A save loaded back into memory, plus everything hydration had to fix.
#[derive(Debug)]
pub struct LoadedWorld {
    pub world: WorldMap,
    pub state: GameState,
    pub timestamp: Option<DateTime<Utc>>,
    pub warnings: Vec<String>,
}

/// Directory-backed key/value store of named worlds.
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SaveStore { dir: dir.into() }
    }

    fn world_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write the full payload for a named world, creating the save
    /// directory on first use.
    pub fn save(
        &self,
        name: &str,
        state: &GameState,
        world: &WorldMap,
    ) -> Result<PathBuf, SaveError> {
        fs::create_dir_all(&self.dir)?;
        let payload = PayloadOut {
            map_data: world.entries(),
            state_data: state,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&payload)?;
        let path = self.world_path(name);
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load a named world, hydrating the state against the loaded map.
    pub fn load(&self, name: &str) -> Result<LoadedWorld, SaveError> {
        let path = self.world_path(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        let mut value: Value = serde_json::from_str(&raw)?;

        let map_data: Vec<(String, Tile)> = value
            .get_mut("map_data")
            .map(Value::take)
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default();
        let world = WorldMap::from_entries(map_data);

        let timestamp = value
            .get("timestamp")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let state_value = value.get_mut("state_data").map(Value::take).unwrap_or(Value::Null);
        let mut warnings = hydration_warnings(&state_value);
        let mut state: GameState = serde_json::from_value(state_value).unwrap_or_default();
        warnings.extend(state.hydrate(&world));

        Ok(LoadedWorld {
            world,
            state,
            timestamp,
            warnings,
        })
    }

    /// Names of every saved world in the store, sorted.
    pub fn list_worlds(&self) -> Result<Vec<String>, SaveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut worlds = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    worlds.push(stem.to_string());
                }
            }
        }
        worlds.sort();
        Ok(worlds)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Scan raw state for problems the lenient deserializer will silently
/// repair, so the repairs stay observable.
fn hydration_warnings(state_value: &Value) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(towns) = state_value.get("settlements").and_then(Value::as_array) {
        for town in towns {
            let name = town
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("(unnamed settlement)");
            if town.get("name").is_none() || town.get("location").is_none() {
                warnings.push(format!("{name}: missing identity fields, dropped"));
                continue;
            }
            if let Some(id) = town.pointer("/tech_project/kind").and_then(Value::as_str) {
                if TechKind::from_id(id).is_none() {
                    warnings.push(format!(
                        "{name}: tech project '{id}' not found in registry, cleared"
                    ));
                }
            }
            if let Some(id) = town.pointer("/unit_project/kind").and_then(Value::as_str) {
                if UnitKind::from_id(id).is_none() {
                    warnings.push(format!(
                        "{name}: unit project '{id}' not found in registry, cleared"
                    ));
                }
            }
        }
    }

    if let Some(units) = state_value.get("units").and_then(Value::as_array) {
        for unit in units {
            let id = unit.get("kind").and_then(Value::as_str).unwrap_or("?");
            if UnitKind::from_id(id).is_none() {
                warnings.push(format!("unknown unit type '{id}', dropped"));
            }
        }
    }

    warnings
}

/// Failures the store can surface. Hydration never fails; these are I/O
/// and top-level JSON problems only.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NotFound(String),
}

impl From<std::io::Error> for SaveError {
    fn from(value: std::io::Error) -> Self {
        SaveError::Io(value)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(value: serde_json::Error) -> Self {
        SaveError::Json(value)
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(err) => write!(f, "save io error: {err}"),
            SaveError::Json(err) => write!(f, "save format error: {err}"),
            SaveError::NotFound(name) => write!(f, "save file not found: {name}"),
        }
    }
}

impl Error for SaveError {}
