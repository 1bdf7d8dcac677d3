//! Cost-aware best-path search over the hex map
//!
//! A* with hex distance as the admissible heuristic. Impassable terrain
//! (the water family and impassable peaks) is pruned from expansion.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::hex::HexCoord;
use crate::worldgen::WorldMap;

/// Node on the A* frontier
#[derive(Clone, Copy, Eq, PartialEq)]
struct PathNode {
    coord: HexCoord,
    cost: u32,
    estimated_total: u32,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimated_total
            .cmp(&self.estimated_total)
            .then_with(|| other.cost.cmp(&self.cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal`, inclusive of both ends.
/// Returns an empty path when the goal is unreachable or either endpoint
/// is off the map.
pub fn find_path(start: HexCoord, goal: HexCoord, world: &WorldMap) -> Vec<HexCoord> {
    if world.get(start).is_none() || world.get(goal).is_none() {
        return Vec::new();
    }

    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut cost_so_far: HashMap<HexCoord, u32> = HashMap::new();

    cost_so_far.insert(start, 0);
    frontier.push(PathNode {
        coord: start,
        cost: 0,
        estimated_total: start.distance(goal) as u32,
    });

    while let Some(current) = frontier.pop() {
        if current.coord == goal {
            break;
        }

        // A stale entry costs more than the best known route to its tile.
        if current.cost > cost_so_far.get(&current.coord).copied().unwrap_or(u32::MAX) {
            continue;
        }

        for next in current.coord.neighbors() {
            let Some(tile) = world.get(next) else { continue };
            let Some(move_cost) = tile.kind.movement_cost() else {
                continue;
            };

            let new_cost = current.cost.saturating_add(move_cost);
            if new_cost < cost_so_far.get(&next).copied().unwrap_or(u32::MAX) {
                cost_so_far.insert(next, new_cost);
                came_from.insert(next, current.coord);
                frontier.push(PathNode {
                    coord: next,
                    cost: new_cost,
                    estimated_total: new_cost + next.distance(goal) as u32,
                });
            }
        }
    }

    if start != goal && !came_from.contains_key(&goal) {
        return Vec::new();
    }

    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Total terrain cost of a path, ignoring the start tile.
pub fn path_cost(path: &[HexCoord], world: &WorldMap) -> u32 {
    path.iter()
        .skip(1)
        .filter_map(|coord| world.get(*coord))
        .filter_map(|tile| tile.kind.movement_cost())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::{TerrainKind, Tile, WorldMap};

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
    fn test_straight_plains_path() {
        let world = flat_world(6, TerrainKind::Plains);
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(4, 0);

        let path = find_path(start, goal, &world);
        assert_eq!(path.len(), 5, "distance 4 means 5 tiles inclusive of start");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path_cost(&path, &world), 4);
    }

    #[test]
    fn test_path_to_self() {
        let world = flat_world(3, TerrainKind::Grassland);
        let here = HexCoord::new(1, 1);
        assert_eq!(find_path(here, here, &world), vec![here]);
    }

    #[test]
    fn test_avoids_impassable_terrain() {
        // A wall of water across the middle, with one plains gap.
        let mut world = flat_world(4, TerrainKind::Plains);
        for r in -4..=4 {
            let coord = HexCoord::new(0, r);
            if world.get(coord).is_some() && r != 3 {
                world.insert(tile(0, r, TerrainKind::Water));
            }
        }

        let path = find_path(HexCoord::new(-3, 1), HexCoord::new(3, -1), &world);
        assert!(!path.is_empty(), "the gap keeps the goal reachable");
        for coord in &path {
            let kind = world.get(*coord).unwrap().kind;
            assert!(kind.movement_cost().is_some(), "path crossed {kind:?}");
        }
    }

    #[test]
    fn test_unreachable_returns_empty() {
        // Goal on an island ringed by deep ocean.
        let mut world = flat_world(4, TerrainKind::Plains);
        let island = HexCoord::new(2, 0);
        for neighbor in island.neighbors() {
            world.insert(tile(neighbor.q, neighbor.r, TerrainKind::DeepOcean));
        }

        assert!(find_path(HexCoord::new(-2, 0), island, &world).is_empty());
    }

    #[test]
    fn test_prefers_cheap_terrain() {
        // Direct route through mountains vs a detour over plains: the
        // detour is longer in tiles but cheaper in cost.
        let mut world = flat_world(3, TerrainKind::Plains);
        world.insert(tile(1, 0, TerrainKind::Mountains));

        let path = find_path(HexCoord::new(0, 0), HexCoord::new(2, 0), &world);
        assert!(!path.contains(&HexCoord::new(1, 0)));
        assert_eq!(path_cost(&path, &world), 3);
    }

    #[test]
    fn test_off_map_endpoints_rejected() {
        let world = flat_world(2, TerrainKind::Plains);
        assert!(find_path(HexCoord::new(0, 0), HexCoord::new(50, 50), &world).is_empty());
        assert!(find_path(HexCoord::new(50, 50), HexCoord::new(0, 0), &world).is_empty());
    }
}
