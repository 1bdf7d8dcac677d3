//! Static blueprint registries
//!
//! Immutable definition tables for jobs, buildings, technologies, tech
//! categories and units. Each registry is a closed enum with per-variant
//! match tables; entries are referenced by kind (never embedded) from
//! settlements, units and projects.

pub mod buildings;
pub mod jobs;
pub mod tech_categories;
pub mod techs;
pub mod units;

pub use buildings::BuildingKind;
pub use jobs::{JobKind, JobYield, CITY_JOB_CAP};
pub use tech_categories::TechCategory;
pub use techs::TechKind;
pub use units::{UnitCost, UnitKind, UnitStats};
