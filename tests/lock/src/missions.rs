//! Mission fixtures shared by the lock tests and the fixture binary.

use std::collections::BTreeMap;

use skyroute_harness::config::{BoundsConfig, MissionConfig};
use skyroute_kernel::carrier::action::Action;

/// Inline cost entries: `energy(action)` for every routing action but `up`,
/// plus takeoff 5 % and land 3 %.
pub fn inline_costs(energy: impl Fn(Action) -> f64) -> BTreeMap<String, f64> {
    let mut entries: BTreeMap<String, f64> = Action::ALL
        .into_iter()
        .filter(|a| *a != Action::Up)
        .map(|a| (a.name().to_string(), energy(a)))
        .collect();
    entries.insert("takeoff".into(), 5.0);
    entries.insert("land".into(), 3.0);
    entries
}

/// Midpoints of the synthetic telemetry ranges.
pub fn midpoint_energy(action: Action) -> f64 {
    match action {
        Action::Down => 1.2,
        Action::Cw | Action::Ccw => 1.5,
        Action::Flip => 2.0,
        _ => 1.0,
    }
}

/// A bounded mission that needs moves on every axis.
pub fn reference_mission() -> MissionConfig {
    MissionConfig {
        goal: [3, -2, 1, 2],
        cost_entries: inline_costs(midpoint_energy),
        max_expansions: 50_000,
        bounds: Some(BoundsConfig {
            min: [-6; 4],
            max: [6; 4],
        }),
        ..MissionConfig::default()
    }
}
