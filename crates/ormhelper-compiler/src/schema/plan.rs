//! Upgrade planning.
//!
//! The migration routine is a straight sequence of independent guards over a
//! running `version` cursor:
//!
//! ```text
//! if (version == F)  { routine(); version = T; }   // explicit origin
//! if (version <= T)  { routine(); version = T; }   // unset origin
//! ```
//!
//! Guards are not chained, so a single run can fire several steps. Steps are
//! ordered by target version, unset origins before explicit ones for the
//! same target, then by origin and routine name, which makes the order total
//! and lets a run hop from any legacy version up to the declared one.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Sentinel used in declarations for an unset origin version.
pub const UNSET_VERSION: i64 = -1;

/// Origin version of an upgrade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "Option<u32>")]
pub enum FromVersion {
    /// Applies to every version at or below the step's target.
    Unset,
    /// Applies to exactly this version.
    Exact(u32),
}

impl FromVersion {
    /// Interprets a declared origin; `None` for negative values other than
    /// the unset sentinel.
    pub fn from_declared(value: i64) -> Option<Self> {
        if value == UNSET_VERSION {
            Some(FromVersion::Unset)
        } else {
            u32::try_from(value).ok().map(FromVersion::Exact)
        }
    }
}

impl From<FromVersion> for Option<u32> {
    fn from(from: FromVersion) -> Self {
        match from {
            FromVersion::Unset => None,
            FromVersion::Exact(v) => Some(v),
        }
    }
}

/// One version transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UpgradeStep {
    pub from: FromVersion,
    pub to: u32,
}

impl UpgradeStep {
    pub fn new(from: FromVersion, to: u32) -> Self {
        Self { from, to }
    }

    /// Whether this step's guard fires at `version`.
    pub fn fires(&self, version: u32) -> bool {
        match self.from {
            FromVersion::Unset => version <= self.to,
            FromVersion::Exact(from) => version == from,
        }
    }
}

impl fmt::Display for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            FromVersion::Unset => write!(f, "(UNSET, {})", self.to),
            FromVersion::Exact(from) => write!(f, "({}, {})", from, self.to),
        }
    }
}

/// A step together with the routine that implements it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    #[serde(flatten)]
    pub step: UpgradeStep,
    pub routine: String,
}

impl PlannedStep {
    pub fn new(step: UpgradeStep, routine: impl Into<String>) -> Self {
        Self {
            step,
            routine: routine.into(),
        }
    }

    fn plan_order(&self, other: &Self) -> Ordering {
        self.step
            .to
            .cmp(&other.step.to)
            .then(self.step.from.cmp(&other.step.from))
            .then_with(|| self.routine.cmp(&other.routine))
    }
}

/// Ordered dispatch sequence for one helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePlan {
    /// The helper's declared version.
    pub target: u32,
    pub steps: Vec<PlannedStep>,
}

impl UpgradePlan {
    /// Orders `steps` into a plan. An empty set yields an empty plan.
    pub fn new(target: u32, steps: impl IntoIterator<Item = PlannedStep>) -> Self {
        let mut steps: Vec<PlannedStep> = steps.into_iter().collect();
        steps.sort_by(PlannedStep::plan_order);
        Self { target, steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replays the generated guards starting at `start`.
    pub fn simulate(&self, start: u32) -> Simulation {
        let mut version = start;
        let mut fired = Vec::new();
        for planned in &self.steps {
            if planned.step.fires(version) {
                fired.push(planned.clone());
                version = planned.step.to;
            }
        }
        Simulation {
            start,
            fired,
            final_version: version,
            reaches_target: version == self.target,
        }
    }
}

/// Outcome of [`UpgradePlan::simulate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Simulation {
    pub start: u32,
    pub fired: Vec<PlannedStep>,
    pub final_version: u32,
    pub reaches_target: bool,
}

/// How a helper's migration routine upgrades an existing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MigrationStrategy {
    /// Drop every table, then create every table again.
    DropAndRecreate,
    /// Run the planned steps.
    Upgrade(UpgradePlan),
}

impl MigrationStrategy {
    /// Chooses the strategy for a helper. With `drop_on_upgrade` the steps
    /// are never planned.
    pub fn for_helper(drop_on_upgrade: bool, target: u32, steps: Vec<PlannedStep>) -> Self {
        if drop_on_upgrade {
            MigrationStrategy::DropAndRecreate
        } else {
            MigrationStrategy::Upgrade(UpgradePlan::new(target, steps))
        }
    }

    pub fn plan(&self) -> Option<&UpgradePlan> {
        match self {
            MigrationStrategy::DropAndRecreate => None,
            MigrationStrategy::Upgrade(plan) => Some(plan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(from: Option<u32>, to: u32, routine: &str) -> PlannedStep {
        let from = from.map(FromVersion::Exact).unwrap_or(FromVersion::Unset);
        PlannedStep::new(UpgradeStep::new(from, to), routine)
    }

    fn mixed_plan() -> UpgradePlan {
        UpgradePlan::new(
            6,
            vec![
                step(None, 4, "toFour"),
                step(None, 5, "toFive"),
                step(None, 6, "toSix"),
                step(Some(1), 3, "fromOne"),
                step(Some(2), 3, "fromTwo"),
            ],
        )
    }

    #[test]
    fn test_mixed_steps_order_by_target_then_origin() {
        let plan = mixed_plan();
        let order: Vec<String> = plan.steps.iter().map(|s| s.step.to_string()).collect();
        assert_eq!(order, vec!["(1, 3)", "(2, 3)", "(UNSET, 4)", "(UNSET, 5)", "(UNSET, 6)"]);
    }

    #[test]
    fn test_simulation_from_one_hops_to_six() {
        let run = mixed_plan().simulate(1);
        let fired: Vec<&str> = run.fired.iter().map(|s| s.routine.as_str()).collect();
        assert_eq!(fired, vec!["fromOne", "toFour", "toFive", "toSix"]);
        assert_eq!(run.final_version, 6);
        assert!(run.reaches_target);
    }

    #[test]
    fn test_exact_origin_fires_only_on_match() {
        let run = mixed_plan().simulate(2);
        let fired: Vec<&str> = run.fired.iter().map(|s| s.routine.as_str()).collect();
        assert_eq!(fired, vec!["fromTwo", "toFour", "toFive", "toSix"]);
    }

    #[test]
    fn test_overlapping_unset_ceilings_both_fire() {
        let plan = UpgradePlan::new(5, vec![step(None, 5, "b"), step(None, 4, "a")]);
        let run = plan.simulate(3);
        let fired: Vec<&str> = run.fired.iter().map(|s| s.routine.as_str()).collect();
        assert_eq!(fired, vec!["a", "b"]);
        assert_eq!(run.final_version, 5);
    }

    #[test]
    fn test_unset_before_explicit_for_same_target() {
        let plan = UpgradePlan::new(3, vec![step(Some(2), 3, "explicit"), step(None, 3, "unset")]);
        assert_eq!(plan.steps[0].routine, "unset");
        assert_eq!(plan.steps[1].routine, "explicit");
    }

    #[test]
    fn test_identical_steps_tie_break_on_routine_name() {
        let plan = UpgradePlan::new(2, vec![step(Some(1), 2, "zeta"), step(Some(1), 2, "alpha")]);
        assert_eq!(plan.steps[0].routine, "alpha");

        // Both guard on the same origin; only the first can fire.
        let run = plan.simulate(1);
        assert_eq!(run.fired.len(), 1);
    }

    #[test]
    fn test_empty_plan_is_a_no_op() {
        let plan = UpgradePlan::new(3, Vec::new());
        assert!(plan.is_empty());
        let run = plan.simulate(1);
        assert!(run.fired.is_empty());
        assert_eq!(run.final_version, 1);
        assert!(!run.reaches_target);
    }

    #[test]
    fn test_drop_on_upgrade_skips_planning() {
        let strategy = MigrationStrategy::for_helper(true, 3, vec![step(Some(1), 3, "ignored")]);
        assert_eq!(strategy, MigrationStrategy::DropAndRecreate);
        assert!(strategy.plan().is_none());
    }

    #[test]
    fn test_declared_origin_sentinel() {
        assert_eq!(FromVersion::from_declared(-1), Some(FromVersion::Unset));
        assert_eq!(FromVersion::from_declared(0), Some(FromVersion::Exact(0)));
        assert_eq!(FromVersion::from_declared(-2), None);
    }

    #[test]
    fn test_plan_serializes_unset_as_null() {
        let plan = UpgradePlan::new(4, vec![step(None, 4, "up")]);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["steps"][0]["from"], serde_json::Value::Null);
        assert_eq!(json["steps"][0]["to"], 4);
        assert_eq!(json["steps"][0]["routine"], "up");
    }
}
