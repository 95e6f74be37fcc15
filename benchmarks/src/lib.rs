//! Shared regimes and helpers for skyroute benchmark suites.

use std::collections::BTreeMap;

use skyroute_harness::config::{BoundsConfig, MissionConfig};
use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::{EdgeCostModel, EnergyCostModel};
use skyroute_kernel::cost::table::CostTable;
use skyroute_search::policy::{PoseBounds, SearchPolicy};
use skyroute_search::search::SearchResult;

/// Typical measured energy per command, in percent.
#[must_use]
pub fn typical_energy(action: Action) -> f64 {
    match action {
        Action::Down => 1.2,
        Action::Cw | Action::Ccw => 1.5,
        Action::Flip => 2.0,
        _ => 1.0,
    }
}

/// A named search workload.
pub struct Regime {
    pub name: &'static str,
    pub start: Pose,
    pub goal: Pose,
    pub policy: SearchPolicy,
}

impl Regime {
    /// The same workload as a mission config with inline costs.
    #[must_use]
    pub fn mission_config(&self) -> MissionConfig {
        let cost_entries: BTreeMap<String, f64> = Action::ALL
            .into_iter()
            .filter(|a| *a != Action::Up)
            .map(|a| (a.name().to_string(), typical_energy(a)))
            .collect();
        MissionConfig {
            start: self.start.components(),
            goal: self.goal.components(),
            cost_entries,
            max_expansions: self.policy.max_expansions,
            max_depth: self.policy.max_depth,
            bounds: self.policy.bounds.map(|b| BoundsConfig {
                min: b.min.components(),
                max: b.max.components(),
            }),
            ..MissionConfig::default()
        }
    }
}

/// Benchmark regimes, from a short hop to a full dead-end sweep.
#[must_use]
pub fn regimes() -> Vec<Regime> {
    let bounded = |radius, max_expansions| SearchPolicy {
        max_expansions,
        bounds: Some(PoseBounds::around(Pose::origin(), radius)),
        ..SearchPolicy::default()
    };
    vec![
        Regime {
            name: "short_hop",
            start: Pose::origin(),
            goal: Pose::new(2, 0, 1, 0),
            policy: bounded(4, 10_000),
        },
        Regime {
            name: "cross_axis",
            start: Pose::origin(),
            goal: Pose::new(4, -3, 2, 3),
            policy: bounded(6, 100_000),
        },
        Regime {
            name: "bounded_dead_end",
            start: Pose::origin(),
            goal: Pose::new(9, 0, 0, 0),
            policy: bounded(3, 100_000),
        },
        Regime {
            name: "budget_limited",
            start: Pose::origin(),
            goal: Pose::new(40, 40, 40, 40),
            policy: SearchPolicy {
                max_expansions: 5_000,
                ..SearchPolicy::default()
            },
        },
    ]
}

/// The energy model built from [`typical_energy`].
///
/// # Panics
///
/// Panics if the table is rejected. Benchmark setup failures are fatal.
#[must_use]
pub fn energy_model() -> EnergyCostModel {
    let table = CostTable::from_fn(typical_energy).expect("valid typical table");
    EnergyCostModel::new(&table).expect("complete table")
}

/// Run `search()` for a regime.
///
/// # Panics
///
/// Panics if `search()` rejects the policy. Benchmark regimes are valid.
#[must_use]
pub fn run_regime(regime: &Regime, model: &dyn EdgeCostModel) -> SearchResult {
    skyroute_search::search::search(regime.start, regime.goal, model, &regime.policy)
        .expect("search should succeed in benchmarks")
}
