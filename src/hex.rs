//! Axial hex-coordinate geometry
//!
//! Pure math shared by world generation, pathfinding and the simulation:
//! neighbor enumeration, hex distance, pixel conversion and range queries.
//! All functions are stateless and total.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex edge length in pixels, the contract shared with any renderer.
pub const HEX_SIZE: f64 = 20.0;

/// The six axial directions in fixed order, starting east and going
/// counter-clockwise.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Axial coordinate on the hex grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        HexCoord { q, r }
    }

    /// Identity key used by the world map and the save format.
    pub fn key(&self) -> String {
        format!("{},{}", self.q, self.r)
    }

    /// Parse a `"q,r"` key back into a coordinate.
    pub fn parse_key(key: &str) -> Option<HexCoord> {
        let (q, r) = key.split_once(',')?;
        Some(HexCoord {
            q: q.trim().parse().ok()?,
            r: r.trim().parse().ok()?,
        })
    }

    /// Center of this hex in pixel space (flat-top orientation).
    pub fn to_pixel(self) -> Pixel {
        let x = HEX_SIZE * (1.5 * self.q as f64);
        let y = HEX_SIZE * (3.0_f64.sqrt() / 2.0 * self.q as f64 + 3.0_f64.sqrt() * self.r as f64);
        Pixel { x, y }
    }

    /// The 6 neighbors in fixed directional order.
    pub fn neighbors(self) -> [HexCoord; 6] {
        let mut out = [HexCoord::new(0, 0); 6];
        for (i, (dq, dr)) in DIRECTIONS.iter().enumerate() {
            out[i] = HexCoord::new(self.q + dq, self.r + dr);
        }
        out
    }

    /// Hex distance (cube-coordinate Manhattan distance halved).
    pub fn distance(self, other: HexCoord) -> i32 {
        ((self.q - other.q).abs()
            + (self.q + self.r - other.q - other.r).abs()
            + (self.r - other.r).abs())
            / 2
    }

    /// All coordinates within `radius` rings, inclusive of the center.
    /// Returns exactly `3r^2 + 3r + 1` coordinates.
    pub fn hexes_in_range(self, radius: i32) -> Vec<HexCoord> {
        let mut results = Vec::new();
        for dq in -radius..=radius {
            let lower = (-radius).max(-dq - radius);
            let upper = radius.min(-dq + radius);
            for dr in lower..=upper {
                results.push(HexCoord::new(self.q + dq, self.r + dr));
            }
        }
        results
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.q, self.r)
    }
}

/// A point in pixel space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    /// Snap this pixel position to the nearest hex using cube rounding.
    pub fn to_hex(self) -> HexCoord {
        let q = (2.0 / 3.0 * self.x) / HEX_SIZE;
        let r = (-1.0 / 3.0 * self.x + 3.0_f64.sqrt() / 3.0 * self.y) / HEX_SIZE;
        hex_round(q, r)
    }
}

fn hex_round(q: f64, r: f64) -> HexCoord {
    let s = -q - r;

    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    HexCoord::new(rq as i32, rr as i32)
}
