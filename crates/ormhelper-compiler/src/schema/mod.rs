//! Table metadata and upgrade planning.
//!
//! - [`extract`] resolves the identifier type of every table class once per
//!   pass and freezes the result in a [`TableRegistry`].
//! - [`plan`] orders a helper's upgrade routines into the guarded dispatch
//!   sequence the migration routine runs.

pub mod extract;
pub mod plan;

pub use extract::{IdType, SchemaExtractor, TableRegistry, TableSpec};
pub use plan::{FromVersion, MigrationStrategy, PlannedStep, Simulation, UpgradePlan, UpgradeStep};
