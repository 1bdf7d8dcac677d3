//! World generation — noise-driven hex terrain
//!
//! Builds a finite hex map in four ordered passes: base terrain from
//! elevation/moisture noise, coastal sand refinement, water depth
//! classification, and swamp refinement. Every probabilistic draw comes
//! from a ChaCha RNG seeded with the world seed, so a map is a pure
//! function of `(radius, seed)`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::hex::HexCoord;
use crate::noise_field::NoiseField;

/// Terrain classification for a single hex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Plains,
    Grassland,
    Sand,
    Swamp,
    Forest,
    Hills,
    Mountains,
    ImpassableMountains,
    Water,
    Ocean,
    DeepOcean,
}

impl TerrainKind {
    /// All terrain kinds, in declaration order.
    pub fn all() -> &'static [TerrainKind] {
        &[
            TerrainKind::Plains,
            TerrainKind::Grassland,
            TerrainKind::Sand,
            TerrainKind::Swamp,
            TerrainKind::Forest,
            TerrainKind::Hills,
            TerrainKind::Mountains,
            TerrainKind::ImpassableMountains,
            TerrainKind::Water,
            TerrainKind::Ocean,
            TerrainKind::DeepOcean,
        ]
    }

    /// Stable identifier, also the save-format spelling.
    pub fn id(&self) -> &'static str {
        match self {
            TerrainKind::Plains => "plains",
            TerrainKind::Grassland => "grassland",
            TerrainKind::Sand => "sand",
            TerrainKind::Swamp => "swamp",
            TerrainKind::Forest => "forest",
            TerrainKind::Hills => "hills",
            TerrainKind::Mountains => "mountains",
            TerrainKind::ImpassableMountains => "impassable_mountains",
            TerrainKind::Water => "water",
            TerrainKind::Ocean => "ocean",
            TerrainKind::DeepOcean => "deep_ocean",
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(
            self,
            TerrainKind::Water | TerrainKind::Ocean | TerrainKind::DeepOcean
        )
    }

    pub fn is_land(&self) -> bool {
        !self.is_water()
    }

    /// Movement cost for pathfinding; `None` marks impassable terrain.
    pub fn movement_cost(&self) -> Option<u32> {
        match self {
            TerrainKind::Plains | TerrainKind::Grassland | TerrainKind::Sand => Some(1),
            TerrainKind::Forest | TerrainKind::Hills => Some(2),
            TerrainKind::Mountains | TerrainKind::Swamp => Some(3),
            TerrainKind::ImpassableMountains
            | TerrainKind::Water
            | TerrainKind::Ocean
            | TerrainKind::DeepOcean => None,
        }
    }

    /// Can a mobile unit forage food here?
    pub fn is_forageable(&self) -> bool {
        matches!(
            self,
            TerrainKind::Grassland | TerrainKind::Forest | TerrainKind::Plains
        )
    }

    /// Valid starting terrain for a fresh tribe.
    pub fn is_spawnable(&self) -> bool {
        matches!(
            self,
            TerrainKind::Grassland | TerrainKind::Plains | TerrainKind::Sand
        )
    }
}

/// One cell of the world map. Created once during generation; only
/// `is_explored` mutates afterwards (fog-of-war reveal).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub q: i32,
    pub r: i32,
    pub kind: TerrainKind,
    pub elevation: f64,
    pub moisture: f64,
    #[serde(default)]
    pub is_explored: bool,
}

impl Tile {
    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

/// Tuning knobs for terrain classification
#[derive(Clone, Debug)]
pub struct GenConfig {
    pub scale: f64,
    /// Offset keeping samples away from the noise origin.
    pub sample_offset: f64,

    // Elevation thresholds (fuzzy ranges)
    pub deep_water: f64,
    pub shallow_water: f64,
    pub plains: f64,
    pub hills_start: f64,
    pub hills_end: f64,
    pub mountain_start: f64,
    pub mountain_end: f64,
    pub peak_start: f64,

    // Moisture bands for the mid-elevation biomes
    pub forest_threshold: f64,
    pub desert_threshold: f64,
    pub swamp_moisture: f64,

    // Coastal & special terrain
    pub beach_chance: f64,
    pub swamp_chance: f64,
    pub deep_ocean_distance: u32,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            scale: 0.1,
            sample_offset: 1000.0,
            deep_water: -0.3,
            shallow_water: 0.0,
            plains: 0.15,
            hills_start: 0.35,
            hills_end: 0.55,
            mountain_start: 0.55,
            mountain_end: 0.75,
            peak_start: 0.85,
            forest_threshold: 0.3,
            desert_threshold: 0.2,
            swamp_moisture: 0.6,
            beach_chance: 0.4,
            swamp_chance: 0.3,
            deep_ocean_distance: 5,
        }
    }
}

/// The world's tile map, keyed by axial coordinate. Owned by the caller
/// and replaceable wholesale on load.
#[derive(Clone, Debug, Default)]
pub struct WorldMap {
    tiles: HashMap<HexCoord, Tile>,
}

impl WorldMap {
    pub fn new() -> Self {
        WorldMap {
            tiles: HashMap::new(),
        }
    }

    pub fn get(&self, coord: HexCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn insert(&mut self, tile: Tile) {
        self.tiles.insert(tile.coord(), tile);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Mark a tile as seen. Out-of-range coordinates are ignored.
    pub fn reveal(&mut self, coord: HexCoord) {
        if let Some(tile) = self.tiles.get_mut(&coord) {
            tile.is_explored = true;
        }
    }

    /// Persistable `(key, tile)` pairs, sorted for stable output.
    pub fn entries(&self) -> Vec<(String, Tile)> {
        let mut entries: Vec<_> = self
            .tiles
            .values()
            .map(|tile| (tile.coord().key(), tile.clone()))
            .collect();
        entries.sort_by(|a, b| {
            let ta = &a.1;
            let tb = &b.1;
            (ta.q, ta.r).cmp(&(tb.q, tb.r))
        });
        entries
    }

    /// Rebuild the map wholesale from persisted pairs.
    pub fn from_entries(entries: Vec<(String, Tile)>) -> Self {
        let mut map = WorldMap::new();
        for (_, tile) in entries {
            map.insert(tile);
        }
        map
    }
}

/// Generate a world of the given hex radius. Deterministic for a fixed
/// seed, including the fuzzy terrain-transition draws.
pub fn generate(radius: i32, seed: u64) -> WorldMap {
    generate_with(radius, seed, &GenConfig::default())
}

pub fn generate_with(radius: i32, seed: u64, cfg: &GenConfig) -> WorldMap {
    let noise = NoiseField::seeded(seed as u32);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut map = WorldMap::new();

    // Pass 1: base terrain from elevation + moisture. Generation order is
    // the iteration order for all later passes, keeping the RNG stream
    // deterministic.
    let mut order = Vec::new();
    for q in -radius..=radius {
        let r1 = (-radius).max(-q - radius);
        let r2 = radius.min(-q + radius);
        for r in r1..=r2 {
            let nx = q as f64 * cfg.scale + cfg.sample_offset;
            let ny = r as f64 * cfg.scale + cfg.sample_offset;

            let elevation = noise.sample(nx, ny);
            let moisture = noise.sample_moisture(nx, ny);

            let kind = classify_base_terrain(elevation, moisture, cfg, &mut rng);
            let coord = HexCoord::new(q, r);
            map.insert(Tile {
                q,
                r,
                kind,
                elevation,
                moisture,
                is_explored: false,
            });
            order.push(coord);
        }
    }

    // Pass 2: coastal refinement. Plains and grassland that touch water
    // sometimes erode into sand.
    for &coord in &order {
        let kind = map.get(coord).map(|t| t.kind);
        if matches!(kind, Some(TerrainKind::Plains) | Some(TerrainKind::Grassland))
            && has_water_neighbor(&map, coord)
            && rng.gen_bool(cfg.beach_chance)
        {
            if let Some(tile) = map.tiles.get_mut(&coord) {
                tile.kind = TerrainKind::Sand;
            }
        }
    }

    // Pass 3: water depth. Coastal water becomes ocean, far water becomes
    // deep ocean, the rest stays inland water.
    for &coord in &order {
        if map.get(coord).map(|t| t.kind) != Some(TerrainKind::Water) {
            continue;
        }
        let dist = distance_to_land(&map, coord);
        let depth = if dist == 1 {
            Some(TerrainKind::Ocean)
        } else if dist > cfg.deep_ocean_distance {
            Some(TerrainKind::DeepOcean)
        } else {
            None
        };
        if let (Some(kind), Some(tile)) = (depth, map.tiles.get_mut(&coord)) {
            tile.kind = kind;
        }
    }

    // Pass 4: swamps in low, wet ground.
    for &coord in &order {
        let Some(tile) = map.get(coord) else { continue };
        if tile.elevation > 0.0
            && tile.elevation < cfg.plains
            && tile.moisture > cfg.swamp_moisture
            && rng.gen_bool(cfg.swamp_chance)
        {
            if let Some(tile) = map.tiles.get_mut(&coord) {
                tile.kind = TerrainKind::Swamp;
            }
        }
    }

    map
}

/// Ordered threshold bands over elevation, with fuzzy plains/hills and
/// hills/mountains transitions, and moisture picking the mid-band biome.
fn classify_base_terrain(
    elevation: f64,
    moisture: f64,
    cfg: &GenConfig,
    rng: &mut ChaCha8Rng,
) -> TerrainKind {
    if elevation < cfg.deep_water || elevation < cfg.shallow_water {
        return TerrainKind::Water;
    }

    if elevation < cfg.plains {
        return TerrainKind::Plains;
    }

    if elevation >= cfg.hills_start && elevation < cfg.hills_end {
        return TerrainKind::Hills;
    }
    if elevation >= cfg.plains && elevation < cfg.hills_start && rng.gen_bool(0.3) {
        // Transition band: early hills amid the lowlands.
        return TerrainKind::Hills;
    }
    if elevation >= cfg.hills_end && elevation < cfg.mountain_start && rng.gen_bool(0.5) {
        return TerrainKind::Hills;
    }

    if elevation >= cfg.mountain_start && elevation < cfg.mountain_end {
        if elevation < cfg.mountain_start + 0.1 && rng.gen_bool(0.4) {
            // Hills persist at the mountain base.
            return TerrainKind::Hills;
        }
        return TerrainKind::Mountains;
    }

    if elevation >= cfg.peak_start {
        return TerrainKind::ImpassableMountains;
    }

    if elevation >= cfg.plains && elevation < cfg.mountain_start {
        if moisture < cfg.desert_threshold {
            return TerrainKind::Sand;
        }
        if moisture > cfg.forest_threshold {
            return TerrainKind::Forest;
        }
        return TerrainKind::Grassland;
    }

    // Elevations between mountain_end and peak_start fall through here.
    TerrainKind::Grassland
}

fn has_water_neighbor(map: &WorldMap, coord: HexCoord) -> bool {
    coord
        .neighbors()
        .iter()
        .any(|n| map.get(*n).map(|t| t.kind.is_water()).unwrap_or(false))
}

/// BFS distance from a water tile to the nearest land tile. Returns 999
/// when no land is reachable.
fn distance_to_land(map: &WorldMap, start: HexCoord) -> u32 {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0));

    while let Some((coord, dist)) = queue.pop_front() {
        if let Some(tile) = map.get(coord) {
            if tile.kind.is_land() {
                return dist;
            }
        }
        for neighbor in coord.neighbors() {
            if visited.insert(neighbor) {
                queue.push_back((neighbor, dist + 1));
            }
        }
        // Off-map coordinates still enqueue their neighbors, but the
        // search stays bounded because the frontier runs out of new keys
        // only when land is found; guard against pathological all-water
        // maps with a hard cap.
        if visited.len() > map.len() * 8 + 64 {
            break;
        }
    }

    999
}

/// Nearest comfortable starting tile, spiraling out from the origin by
/// increasing ring radius. Falls back to the origin when 20 rings of
/// searching find nothing.
pub fn find_safe_spawn(map: &WorldMap) -> HexCoord {
    for rad in 0..=20 {
        for q in -rad..=rad {
            let r1 = (-rad).max(-q - rad);
            let r2 = rad.min(-q + rad);
            for r in r1..=r2 {
                let coord = HexCoord::new(q, r);
                if let Some(tile) = map.get(coord) {
                    if tile.kind.is_spawnable() {
                        return coord;
                    }
                }
            }
        }
    }
    println!("warning: no dry land near the center, spawning at the origin");
    HexCoord::new(0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_count_matches_radius() {
        for radius in [1, 4, 8] {
            let map = generate(radius, 99);
            let expected = (3 * radius * radius + 3 * radius + 1) as usize;
            assert_eq!(map.len(), expected);
        }
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let a = generate(8, 1234);
        let b = generate(8, 1234);
        for tile in a.tiles() {
            let other = b.get(tile.coord()).expect("tile exists in both maps");
            assert_eq!(tile, other);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(8, 1);
        let b = generate(8, 2);
        let differs = a
            .tiles()
            .any(|tile| b.get(tile.coord()).map(|t| t.kind) != Some(tile.kind));
        assert!(differs);
    }

    #[test]
    fn test_terrain_validity() {
        let map = generate(10, 42);
        for tile in map.tiles() {
            assert!((-1.1..=1.1).contains(&tile.elevation));
            assert!((-1.1..=1.1).contains(&tile.moisture));
            assert!(!tile.is_explored);
        }
    }

    #[test]
    fn test_ocean_touches_land() {
        let map = generate(10, 7);
        for tile in map.tiles() {
            if tile.kind == TerrainKind::Ocean {
                let coastal = tile
                    .coord()
                    .neighbors()
                    .iter()
                    .any(|n| map.get(*n).map(|t| t.kind.is_land()).unwrap_or(false));
                assert!(coastal, "ocean tile at {} has no land neighbor", tile.coord());
            }
        }
    }

    #[test]
    fn test_deep_ocean_is_far_from_land() {
        let map = generate(12, 7);
        for tile in map.tiles() {
            if tile.kind == TerrainKind::DeepOcean {
                let near_land = tile
                    .coord()
                    .hexes_in_range(5)
                    .into_iter()
                    .any(|c| map.get(c).map(|t| t.kind.is_land()).unwrap_or(false));
                assert!(!near_land, "deep ocean at {} is near land", tile.coord());
            }
        }
    }

    #[test]
    fn test_safe_spawn_is_spawnable_or_origin() {
        let map = generate(10, 3);
        let spawn = find_safe_spawn(&map);
        match map.get(spawn) {
            Some(tile) => assert!(tile.kind.is_spawnable() || spawn == HexCoord::new(0, 0)),
            None => assert_eq!(spawn, HexCoord::new(0, 0)),
        }
    }

    #[test]
    fn test_entries_round_trip() {
        let map = generate(5, 11);
        let reloaded = WorldMap::from_entries(map.entries());
        assert_eq!(map.len(), reloaded.len());
        for tile in map.tiles() {
            assert_eq!(reloaded.get(tile.coord()), Some(tile));
        }
    }

    #[test]
    fn test_out_of_range_lookup_is_none() {
        let map = generate(4, 5);
        assert!(map.get(HexCoord::new(100, 100)).is_none());
    }
}
