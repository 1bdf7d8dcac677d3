//! Settlement and unit simulation
//!
//! The turn-stepped core: per-colony economics, mobile units, the global
//! game state with its planning command surface, and the turn resolver
//! that ties them together.
//!
//! # Module Structure
//!
//! - `log`: categorized turn events and the capped activity archive
//! - `settlement`: per-colony economy (jobs, projects, growth)
//! - `unit`: mobile agents and their hydration from saves
//! - `state`: the global `GameState` plus planning commands
//! - `turn`: `process_turn`, the single state transition

pub mod log;
pub mod settlement;
pub mod state;
pub mod turn;
pub mod unit;

pub use log::{ActivityLog, LogCategory, LogEntry, SourcedEntry, TurnRecord, MAX_ARCHIVED_TURNS};
pub use settlement::{
    ConstructionProject, Settlement, SettlementTurn, Stockpile, TechProject, UnitProject,
};
pub use state::{
    CommandError, GameState, MoveTarget, PendingActions, Phase, Tribe, TribeInventory,
};
pub use turn::process_turn;
pub use unit::{Unit, UnitInventory};
