//! Seeded 2D gradient noise
//!
//! Thin sampler over `noise::Perlin` used for terrain elevation and
//! moisture. The same seed always reproduces the same field, which keeps
//! world generation a pure function of its seed.

use noise::{NoiseFn, Perlin};

/// Coordinate offset separating the moisture channel from the elevation
/// channel within the same field.
pub const MOISTURE_OFFSET: f64 = 500.0;

/// A seeded, continuous 2D noise field with output roughly in [-1, 1].
#[derive(Clone, Debug)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    pub fn seeded(seed: u32) -> Self {
        NoiseField {
            perlin: Perlin::new(seed),
        }
    }

    /// Sample the field at a continuous position.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x, y])
    }

    /// Sample the moisture channel (the same field at a fixed offset).
    pub fn sample_moisture(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x + MOISTURE_OFFSET, y + MOISTURE_OFFSET])
    }
}
