//! Turn-based hex-grid colony simulation engine
//!
//! Re-exports modules for use by the runner binary and tools.

pub mod hex;
pub mod noise_field;
pub mod pathfinder;
pub mod registry;
pub mod save;
pub mod simulation;
pub mod worldgen;
