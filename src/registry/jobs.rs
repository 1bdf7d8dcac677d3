//! Job definitions — labor assignments and their yields
//!
//! Tile-bound jobs (forager, woodcutter, gatherer) are capped by the
//! terrain around a settlement; city jobs get a large fixed cap. Priority
//! decides who is evicted last when population drops.

use serde::{Deserialize, Serialize};

use crate::worldgen::TerrainKind;

/// Effective cap for jobs that do not depend on surrounding terrain.
pub const CITY_JOB_CAP: u32 = 100;

/// Per-worker resource yield of a job, applied once per turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobYield {
    pub food: u32,
    pub materials: u32,
    pub science: u32,
}

/// Types of jobs available
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Forager,
    Woodcutter,
    Gatherer,
    Trainer,
    Scholar,
    Innovator,
}

impl JobKind {
    /// All jobs in registry order. Eviction ties break on this order.
    pub fn all() -> &'static [JobKind] {
        &[
            JobKind::Forager,
            JobKind::Woodcutter,
            JobKind::Gatherer,
            JobKind::Trainer,
            JobKind::Scholar,
            JobKind::Innovator,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            JobKind::Forager => "forager",
            JobKind::Woodcutter => "woodcutter",
            JobKind::Gatherer => "gatherer",
            JobKind::Trainer => "trainer",
            JobKind::Scholar => "scholar",
            JobKind::Innovator => "innovator",
        }
    }

    pub fn from_id(id: &str) -> Option<JobKind> {
        JobKind::all().iter().copied().find(|kind| kind.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Forager => "Forager",
            JobKind::Woodcutter => "Woodcutter",
            JobKind::Gatherer => "Stick Gatherer",
            JobKind::Trainer => "Trainer",
            JobKind::Scholar => "Scholar",
            JobKind::Innovator => "Innovator",
        }
    }

    /// Rebalancing evicts the lowest priority first.
    pub fn priority(&self) -> u32 {
        match self {
            JobKind::Forager => 100,
            JobKind::Woodcutter => 80,
            JobKind::Gatherer => 70,
            JobKind::Trainer => 50,
            JobKind::Scholar => 40,
            JobKind::Innovator => 40,
        }
    }

    /// Resources produced per worker per turn. Trainer and innovator
    /// drive project progress instead of yielding inventory.
    pub fn yields(&self) -> JobYield {
        match self {
            JobKind::Forager => JobYield {
                food: 2,
                ..JobYield::default()
            },
            JobKind::Woodcutter => JobYield {
                materials: 2,
                ..JobYield::default()
            },
            JobKind::Gatherer => JobYield {
                materials: 1,
                ..JobYield::default()
            },
            JobKind::Scholar => JobYield {
                science: 1,
                ..JobYield::default()
            },
            JobKind::Trainer | JobKind::Innovator => JobYield::default(),
        }
    }

    /// Terrain kinds that open up a slot for this job. Empty for city
    /// jobs.
    pub fn allowed_terrain(&self) -> &'static [TerrainKind] {
        match self {
            JobKind::Forager => &[
                TerrainKind::Grassland,
                TerrainKind::Plains,
                TerrainKind::Forest,
            ],
            JobKind::Woodcutter => &[TerrainKind::Forest],
            JobKind::Gatherer => &[TerrainKind::Grassland, TerrainKind::Plains],
            JobKind::Trainer | JobKind::Scholar | JobKind::Innovator => &[],
        }
    }

    /// Is this job's cap derived from the surrounding terrain?
    pub fn is_tile_bound(&self) -> bool {
        !self.allowed_terrain().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for kind in JobKind::all() {
            assert_eq!(JobKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(JobKind::from_id("farmer"), None);
    }

    #[test]
    fn test_survival_jobs_outrank_specialists() {
        assert!(JobKind::Forager.priority() > JobKind::Woodcutter.priority());
        assert!(JobKind::Gatherer.priority() > JobKind::Trainer.priority());
        assert_eq!(JobKind::Scholar.priority(), JobKind::Innovator.priority());
    }

    #[test]
    fn test_tile_bound_jobs() {
        assert!(JobKind::Forager.is_tile_bound());
        assert!(JobKind::Woodcutter.is_tile_bound());
        assert!(JobKind::Gatherer.is_tile_bound());
        assert!(!JobKind::Scholar.is_tile_bound());
        assert!(!JobKind::Trainer.is_tile_bound());
        assert!(!JobKind::Innovator.is_tile_bound());
    }
}
