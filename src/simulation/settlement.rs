//! Settlement economy — population, labor, projects and growth
//!
//! A settlement advances once per turn in a fixed order: produce from job
//! assignments, advance construction, advance tech incorporation, advance
//! recruitment, then feed and grow the population. Player-driven commands
//! (job assignment, starting projects) validate and reject without partial
//! application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hex::HexCoord;
use crate::registry::{BuildingKind, JobKind, TechCategory, TechKind, UnitKind, CITY_JOB_CAP};
use crate::simulation::log::{LogCategory, LogEntry};
use crate::simulation::unit::Unit;
use crate::worldgen::WorldMap;

/// Base housing before any shelter is built.
const BASE_HOUSING: u32 = 2;
/// Growth slows down by this factor after every new citizen.
const GROWTH_THRESHOLD_FACTOR: f64 = 1.2;

/// Resources held by a settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    #[serde(default)]
    pub food: u32,
    #[serde(default)]
    pub materials: u32,
    #[serde(default)]
    pub science: u32,
}

impl Stockpile {
    /// Stock a freshly founded settlement starts with.
    pub fn starting() -> Self {
        Stockpile {
            food: 50,
            materials: 50,
            science: 0,
        }
    }
}

/// An in-progress building. Progress counts down one per turn regardless
/// of labor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionProject {
    pub kind: BuildingKind,
    pub progress: i32,
}

/// An in-progress tech incorporation, driven by innovator labor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechProject {
    pub kind: TechKind,
    pub progress: i32,
    pub max: i32,
}

/// An in-progress recruitment, driven by trainer labor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProject {
    pub kind: UnitKind,
    pub progress: i32,
    pub max: i32,
}

/// Result of one settlement turn.
#[derive(Clone, Debug, Default)]
pub struct SettlementTurn {
    pub logs: Vec<LogEntry>,
    pub recruits: Vec<Unit>,
}

/// A player-controlled colony
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub name: String,
    pub location: HexCoord,
    #[serde(default = "default_population")]
    pub population: u32,
    #[serde(default)]
    pub growth_bucket: u32,
    #[serde(default = "default_growth_threshold")]
    pub growth_threshold: u32,
    #[serde(default = "Stockpile::starting")]
    pub inventory: Stockpile,
    #[serde(default, deserialize_with = "lenient_list")]
    pub buildings: Vec<BuildingKind>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_project: Option<ConstructionProject>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub known_techs: Vec<TechKind>,
    #[serde(default, deserialize_with = "lenient")]
    pub tech_project: Option<TechProject>,
    #[serde(default = "default_tech_levels", deserialize_with = "lenient_counts")]
    pub tech_levels: BTreeMap<TechCategory, u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub unit_project: Option<UnitProject>,
    #[serde(default, deserialize_with = "lenient_counts")]
    pub assignments: BTreeMap<JobKind, u32>,
    #[serde(default, deserialize_with = "lenient_counts")]
    pub job_cap: BTreeMap<JobKind, u32>,
}

fn default_population() -> u32 {
    5
}

fn default_growth_threshold() -> u32 {
    10
}

fn default_tech_levels() -> BTreeMap<TechCategory, u32> {
    TechCategory::all().iter().map(|cat| (*cat, 1)).collect()
}

/// Total, forgiving field deserializer: a malformed or dangling value
/// degrades to `None` instead of failing the whole load.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], for lists of registry kinds: entries that no longer
/// resolve are skipped instead of failing the load.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer).unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Like [`lenient`], for count maps keyed by registry kinds.
fn lenient_counts<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, u32>, D::Error>
where
    D: serde::Deserializer<'de>,
    K: serde::de::DeserializeOwned + Ord,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer).unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let kind = serde_json::from_value(serde_json::Value::String(key)).ok()?;
            let count = value.as_u64()? as u32;
            Some((kind, count))
        })
        .collect())
}

impl Settlement {
    pub fn new(name: impl Into<String>, location: HexCoord) -> Self {
        Settlement {
            name: name.into(),
            location,
            population: default_population(),
            growth_bucket: 0,
            growth_threshold: default_growth_threshold(),
            inventory: Stockpile::starting(),
            buildings: Vec::new(),
            current_project: None,
            known_techs: Vec::new(),
            tech_project: None,
            tech_levels: default_tech_levels(),
            unit_project: None,
            assignments: BTreeMap::new(),
            job_cap: BTreeMap::new(),
        }
    }

    /// Create a settlement and immediately scan the surrounding terrain
    /// for job capacity.
    pub fn founded(name: impl Into<String>, location: HexCoord, world: &WorldMap) -> Self {
        let mut town = Settlement::new(name, location);
        town.scan_resources(world);
        town
    }

    // =====================================================================
    //  Resource scanning & job assignment
    // =====================================================================

    /// Radius of workable land, widening once the settlement matures.
    pub fn work_radius(&self) -> i32 {
        if self.population >= 10 {
            2
        } else {
            1
        }
    }

    /// Recompute job caps from the surrounding terrain. Must be re-run
    /// whenever population crosses the radius threshold or the world data
    /// changes underneath (e.g. after a load).
    pub fn scan_resources(&mut self, world: &WorldMap) {
        self.job_cap.clear();
        for job in JobKind::all() {
            let cap = if job.is_tile_bound() { 0 } else { CITY_JOB_CAP };
            self.job_cap.insert(*job, cap);
        }

        for coord in self.location.hexes_in_range(self.work_radius()) {
            if coord == self.location {
                continue;
            }
            let Some(tile) = world.get(coord) else { continue };
            for job in JobKind::all() {
                if job.allowed_terrain().contains(&tile.kind) {
                    *self.job_cap.entry(*job).or_insert(0) += 1;
                }
            }
        }
    }

    pub fn total_assigned(&self) -> u32 {
        self.assignments.values().sum()
    }

    pub fn idle_population(&self) -> u32 {
        self.population.saturating_sub(self.total_assigned())
    }

    /// Add or remove one worker. Fails without side effects when idle
    /// population or the job cap forbids it.
    pub fn assign_job(&mut self, job: JobKind, delta: i32) -> bool {
        let current = self.assignments.get(&job).copied().unwrap_or(0);
        if delta > 0 {
            let cap = self.job_cap.get(&job).copied().unwrap_or(0);
            if self.idle_population() == 0 || current >= cap {
                return false;
            }
            self.assignments.insert(job, current + 1);
        } else {
            if current == 0 {
                return false;
            }
            self.assignments.insert(job, current - 1);
        }
        true
    }

    /// Evict workers from the lowest-priority jobs until the workforce
    /// fits the population again. Ties break on registry order.
    pub fn rebalance_jobs(&mut self) -> Vec<LogEntry> {
        let mut logs = Vec::new();
        self.rebalance_into(&mut logs);
        logs
    }

    fn rebalance_into(&mut self, logs: &mut Vec<LogEntry>) {
        while self.total_assigned() > self.population {
            let mut worst: Option<JobKind> = None;
            let mut min_priority = u32::MAX;
            for job in JobKind::all() {
                let count = self.assignments.get(job).copied().unwrap_or(0);
                if count > 0 && job.priority() < min_priority {
                    min_priority = job.priority();
                    worst = Some(*job);
                }
            }
            let Some(job) = worst else { break };
            *self.assignments.get_mut(&job).expect("assigned job exists") -= 1;
            logs.push(LogEntry::new(
                LogCategory::Warning,
                format!("Lost a {} (population dropped)", job.name()),
            ));
        }
    }

    // =====================================================================
    //  Turn update
    // =====================================================================

    /// Advance the settlement by one turn. Returns the log entries and
    /// any units whose training completed.
    pub fn update(&mut self) -> SettlementTurn {
        let mut turn = SettlementTurn::default();
        self.produce_resources(&mut turn.logs);
        self.advance_construction(&mut turn.logs);
        self.advance_tech(&mut turn.logs);
        self.advance_recruitment(&mut turn);
        self.handle_growth(&mut turn.logs);
        turn
    }

    fn produce_resources(&mut self, logs: &mut Vec<LogEntry>) {
        for job in JobKind::all() {
            let count = self.assignments.get(job).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            let yields = job.yields();
            let mut parts = Vec::new();
            if yields.food > 0 {
                let amount = yields.food * count;
                self.inventory.food += amount;
                parts.push(format!("{amount} Food"));
            }
            if yields.materials > 0 {
                let amount = yields.materials * count;
                self.inventory.materials += amount;
                parts.push(format!("{amount} Materials"));
            }
            if yields.science > 0 {
                let amount = yields.science * count;
                self.inventory.science += amount;
                parts.push(format!("{amount} Science"));
            }
            if !parts.is_empty() {
                logs.push(LogEntry::new(
                    LogCategory::Production,
                    format!("{count} {}s produced {}", job.name(), parts.join(" & ")),
                ));
            }
        }
    }

    // =====================================================================
    //  Construction
    // =====================================================================

    /// Queue a building. Rejected when a project is already active, the
    /// unlocking tech is unknown, materials are short, or the upgrade
    /// predecessor is missing. Materials are paid up front.
    pub fn start_construction(&mut self, kind: BuildingKind) -> bool {
        if let Some(tech) = unlocking_tech(kind) {
            if !self.known_techs.contains(&tech) {
                return false;
            }
        }
        if self.inventory.materials < kind.cost_materials() {
            return false;
        }
        if let Some(predecessor) = kind.upgrade_from() {
            if !self.buildings.contains(&predecessor) {
                return false;
            }
        }
        if self.current_project.is_some() {
            return false;
        }

        self.inventory.materials -= kind.cost_materials();
        self.current_project = Some(ConstructionProject {
            kind,
            progress: kind.build_time() as i32,
        });
        true
    }

    fn advance_construction(&mut self, logs: &mut Vec<LogEntry>) {
        let Some(project) = self.current_project.as_mut() else {
            return;
        };
        project.progress -= 1;
        if project.progress <= 0 {
            let kind = project.kind;
            self.current_project = None;
            if let Some(predecessor) = kind.upgrade_from() {
                if let Some(index) = self.buildings.iter().position(|b| *b == predecessor) {
                    self.buildings.remove(index);
                }
            }
            self.buildings.push(kind);
            logs.push(LogEntry::new(
                LogCategory::Build,
                format!("Construction complete: {}", kind.name()),
            ));
        } else {
            logs.push(LogEntry::new(
                LogCategory::Build,
                format!(
                    "Working on {} ({} turns left)",
                    project.kind.name(),
                    project.progress
                ),
            ));
        }
    }

    // =====================================================================
    //  Tech & category upgrades
    // =====================================================================

    pub fn category_level(&self, cat: TechCategory) -> u32 {
        self.tech_levels.get(&cat).copied().unwrap_or(1)
    }

    /// Science cost of the next level for a category.
    pub fn category_cost(&self, cat: TechCategory) -> u32 {
        cat.cost_at_level(self.category_level(cat))
    }

    /// Pay science to raise a category level by one.
    pub fn upgrade_category(&mut self, cat: TechCategory) -> bool {
        let cost = self.category_cost(cat);
        if self.inventory.science < cost {
            return false;
        }
        self.inventory.science -= cost;
        *self.tech_levels.entry(cat).or_insert(1) += 1;
        true
    }

    /// Start incorporating a tech. Science is paid up front; progress is
    /// then driven only by innovator labor.
    pub fn start_tech_project(&mut self, kind: TechKind) -> bool {
        if self.tech_project.is_some() {
            return false;
        }
        for (cat, required) in kind.requirements() {
            if self.category_level(*cat) < *required {
                return false;
            }
        }
        if self.inventory.science < kind.cost() {
            return false;
        }

        self.inventory.science -= kind.cost();
        self.tech_project = Some(TechProject {
            kind,
            progress: kind.effort() as i32,
            max: kind.effort() as i32,
        });
        true
    }

    fn advance_tech(&mut self, logs: &mut Vec<LogEntry>) {
        let innovators = self.assignments.get(&JobKind::Innovator).copied().unwrap_or(0);
        let Some(project) = self.tech_project.as_mut() else {
            return;
        };
        if innovators == 0 {
            logs.push(LogEntry::new(
                LogCategory::Warning,
                format!(
                    "{} incorporation stalled (need Innovators)",
                    project.kind.name()
                ),
            ));
            return;
        }

        project.progress -= innovators as i32;
        logs.push(LogEntry::new(
            LogCategory::Tech,
            format!(
                "Incorporating {} ({} effort left)",
                project.kind.name(),
                project.progress
            ),
        ));
        if project.progress <= 0 {
            let kind = project.kind;
            self.tech_project = None;
            self.known_techs.push(kind);
            logs.push(LogEntry::new(
                LogCategory::Tech,
                format!("Tech unlocked: {}", kind.name()),
            ));
        }
    }

    // =====================================================================
    //  Recruitment
    // =====================================================================

    /// Start training a unit. Food and materials are paid up front.
    pub fn start_unit_project(&mut self, kind: UnitKind) -> bool {
        if self.unit_project.is_some() {
            return false;
        }
        let cost = kind.cost();
        if self.inventory.food < cost.food || self.inventory.materials < cost.materials {
            return false;
        }

        self.inventory.food -= cost.food;
        self.inventory.materials -= cost.materials;
        self.unit_project = Some(UnitProject {
            kind,
            progress: kind.train_time() as i32,
            max: kind.train_time() as i32,
        });
        true
    }

    fn advance_recruitment(&mut self, turn: &mut SettlementTurn) {
        let trainers = self.assignments.get(&JobKind::Trainer).copied().unwrap_or(0);
        let Some(project) = self.unit_project.as_mut() else {
            return;
        };
        if trainers == 0 {
            turn.logs.push(LogEntry::new(
                LogCategory::Warning,
                "Training stalled (no Trainers assigned)",
            ));
            return;
        }

        project.progress -= trainers as i32;
        turn.logs.push(LogEntry::new(
            LogCategory::Unit,
            format!(
                "Training {} ({} work left)",
                project.kind.name(),
                project.progress
            ),
        ));
        if project.progress <= 0 {
            self.complete_unit(turn);
        }
    }

    fn complete_unit(&mut self, turn: &mut SettlementTurn) {
        let Some(project) = self.unit_project else {
            return;
        };
        let kind = project.kind;
        // Population may have dropped since the project started. The paid
        // cost is not refunded; completion waits for the population to
        // recover.
        if self.population <= kind.pop_cost() {
            turn.logs.push(LogEntry::new(
                LogCategory::Warning,
                format!("Cannot finish {}: population too low", kind.name()),
            ));
            return;
        }

        self.population -= kind.pop_cost();
        self.rebalance_into(&mut turn.logs);
        turn.recruits.push(Unit::recruit(kind, self.location));
        turn.logs.push(LogEntry::new(
            LogCategory::Unit,
            format!("Unit ready: {} joined the empire", kind.name()),
        ));
        self.unit_project = None;
    }

    // =====================================================================
    //  Growth & consumption
    // =====================================================================

    /// Population capacity from base housing plus built shelters.
    pub fn housing_cap(&self) -> u32 {
        BASE_HOUSING + self.buildings.iter().map(|b| b.housing()).sum::<u32>()
    }

    fn handle_growth(&mut self, logs: &mut Vec<LogEntry>) {
        if self.population >= self.housing_cap() {
            self.consume_food(false, logs);
            return;
        }
        if !self.consume_food(true, logs) {
            return;
        }

        self.growth_bucket += 1;
        logs.push(LogEntry::new(
            LogCategory::Growth,
            format!(
                "Population growing ({}/{})",
                self.growth_bucket, self.growth_threshold
            ),
        ));

        if self.growth_bucket >= self.growth_threshold {
            self.population += 1;
            self.growth_bucket = 0;
            self.growth_threshold =
                (self.growth_threshold as f64 * GROWTH_THRESHOLD_FACTOR).floor() as u32;
            logs.push(LogEntry::new(
                LogCategory::Growth,
                format!("A new citizen was born! Population is now {}", self.population),
            ));
        }
    }

    /// Feed the population. With `allow_surplus`, one extra food is
    /// consumed toward growth when stock covers it; returns whether the
    /// surplus was eaten. A shortfall zeroes the stock and logs
    /// starvation.
    fn consume_food(&mut self, allow_surplus: bool, logs: &mut Vec<LogEntry>) -> bool {
        let need = self.population;
        let growth_cost = if allow_surplus && self.inventory.food >= need + 1 {
            1
        } else {
            0
        };
        let total = need + growth_cost;

        if self.inventory.food >= total {
            self.inventory.food -= total;
            if growth_cost > 0 {
                logs.push(LogEntry::new(
                    LogCategory::Consumption,
                    format!("Consumed {total} Food ({need} eaten, {growth_cost} growth)"),
                ));
                return true;
            }
            logs.push(LogEntry::new(
                LogCategory::Consumption,
                format!("Consumed {total} Food (Maintenance)"),
            ));
        } else {
            let eaten = self.inventory.food;
            self.inventory.food = 0;
            logs.push(LogEntry::new(
                LogCategory::Warning,
                format!("STARVATION: population needed {need} but only ate {eaten}"),
            ));
        }
        false
    }

    // =====================================================================
    //  Planning projections (no mutation)
    // =====================================================================

    /// One-turn lookahead mirroring `update`'s arithmetic, for the
    /// pre-commit plan preview.
    pub fn planned_events(&self) -> Vec<LogEntry> {
        let mut events = Vec::new();
        let mut projected_food_in: u32 = 0;
        let mut production = Vec::new();

        for job in JobKind::all() {
            let count = self.assignments.get(job).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            let yields = job.yields();
            let mut parts = Vec::new();
            if yields.food > 0 {
                let amount = yields.food * count;
                projected_food_in += amount;
                parts.push(format!("+{amount} Food"));
            }
            if yields.materials > 0 {
                parts.push(format!("+{} Materials", yields.materials * count));
            }
            if yields.science > 0 {
                parts.push(format!("+{} Science", yields.science * count));
            }
            if !parts.is_empty() {
                production.push(LogEntry::new(
                    LogCategory::Production,
                    format!("{count} {}s: {}", job.name(), parts.join(", ")),
                ));
            }
        }

        let food_need = self.population;
        let total_available = self.inventory.food + projected_food_in;
        let mut projected_out = food_need;
        let mut projected_growth = 0;
        if total_available >= food_need + 1 && self.population < self.housing_cap() {
            projected_growth = 1;
            projected_out += 1;
        }

        let net = projected_food_in as i64 - projected_out as i64;
        let sign = if net >= 0 { "+" } else { "" };
        events.push(LogEntry::new(
            LogCategory::Info,
            format!("NET FOOD: {sign}{net} (In: {projected_food_in}, Out: {projected_out})"),
        ));

        if projected_growth > 0 {
            events.push(LogEntry::new(
                LogCategory::Consumption,
                format!("Anticipated: {projected_out} Food ({food_need} eat, 1 growth)"),
            ));
        } else if total_available < food_need {
            events.push(LogEntry::new(
                LogCategory::Warning,
                format!(
                    "Starvation imminent (short by {})",
                    food_need - total_available
                ),
            ));
        } else {
            events.push(LogEntry::new(
                LogCategory::Consumption,
                format!("Anticipated: {projected_out} Food (Maintenance)"),
            ));
        }

        events.extend(production);

        if let Some(project) = &self.tech_project {
            let innovators = self.assignments.get(&JobKind::Innovator).copied().unwrap_or(0);
            if innovators > 0 {
                events.push(LogEntry::new(
                    LogCategory::Tech,
                    format!("Tech: {} (+{innovators} progress)", project.kind.name()),
                ));
            } else {
                events.push(LogEntry::new(
                    LogCategory::Warning,
                    format!("Tech: {} (stalled)", project.kind.name()),
                ));
            }
        }
        if let Some(project) = &self.unit_project {
            let trainers = self.assignments.get(&JobKind::Trainer).copied().unwrap_or(0);
            if trainers > 0 {
                events.push(LogEntry::new(
                    LogCategory::Unit,
                    format!("Unit: {} (+{trainers} progress)", project.kind.name()),
                ));
            } else {
                events.push(LogEntry::new(
                    LogCategory::Warning,
                    format!("Unit: {} (stalled)", project.kind.name()),
                ));
            }
        }
        if let Some(project) = &self.current_project {
            events.push(LogEntry::new(
                LogCategory::Build,
                format!("Building: {} (1 turn closer)", project.kind.name()),
            ));
        }

        events
    }

    /// Total yields if every workable tile in range were staffed; used by
    /// the planning surface to show the settlement's potential.
    pub fn potential_yields(&self, world: &WorldMap) -> Stockpile {
        let mut potential = Stockpile::default();
        for coord in self.location.hexes_in_range(self.work_radius()) {
            if coord == self.location {
                continue;
            }
            let Some(tile) = world.get(coord) else { continue };
            for job in JobKind::all() {
                if job.is_tile_bound() && job.allowed_terrain().contains(&tile.kind) {
                    let yields = job.yields();
                    potential.food += yields.food;
                    potential.materials += yields.materials;
                    potential.science += yields.science;
                }
            }
        }
        potential
    }

    // =====================================================================
    //  Load hydration
    // =====================================================================

    /// Fill in anything an older save is missing. Total: never fails,
    /// only defaults and records what it changed.
    pub fn hydrate(&mut self, world: &WorldMap, warnings: &mut Vec<String>) {
        for cat in TechCategory::all() {
            if !self.tech_levels.contains_key(cat) {
                self.tech_levels.insert(*cat, 1);
                warnings.push(format!(
                    "{}: defaulted {} to level 1",
                    self.name,
                    cat.name()
                ));
            }
        }
        self.scan_resources(world);
    }
}

/// The tech that unlocks a building, if any gates it.
fn unlocking_tech(building: BuildingKind) -> Option<TechKind> {
    TechKind::all()
        .iter()
        .copied()
        .find(|tech| tech.unlocks().contains(&building.id()))
}
