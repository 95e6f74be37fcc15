//! Edge cost models: the per-action weight the search adds to `f`.
//!
//! [`EnergyCostModel`] is the production model:
//! `edge_cost(a) = MOVEMENT_COST + energy(a)`, with `energy(up)` pinned to
//! [`UP_ENERGY_PERCENT`] whatever the table says. Synthetic sorties never
//! fly `up`, so its measured value is not trusted.
//!
//! Costs are resolved once at construction into a fixed array; lookups in
//! the search loop are an index, not a map access.

use crate::carrier::action::Action;
use crate::cost::table::{CostTable, CostTableError};
use crate::cost::units::CostUnits;

/// Unit movement cost added to every action's energy.
pub const MOVEMENT_COST: f64 = 1.0;

/// Fixed energy (percent) used for `up` instead of the table entry.
pub const UP_ENERGY_PERCENT: f64 = 1.01;

/// Per-action edge weight consumed by the search.
///
/// Implementations must be pure: the same action always yields the same
/// cost for the lifetime of the model. Shared read-only across threads.
pub trait EdgeCostModel: Send + Sync {
    /// Total edge cost for taking `action` once.
    fn edge_cost(&self, action: Action) -> CostUnits;

    /// Stable identifier recorded in search audit graphs.
    fn model_id(&self) -> &str;
}

const fn movement_units() -> CostUnits {
    CostUnits::PER_STEP
}

/// The energy of `up` in [`CostUnits`].
#[must_use]
pub const fn up_energy() -> CostUnits {
    // 1.01 percent.
    CostUnits::from_units(1_010_000)
}

/// Movement plus measured energy, with `up` overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyCostModel {
    energy: [CostUnits; Action::COUNT],
    edge: [CostUnits; Action::COUNT],
}

impl EnergyCostModel {
    /// Resolve edge costs from a validated table.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError::MissingEntry`] if a non-`up` routing action
    /// has no energy. Validated tables never do; the check keeps the model
    /// fail-closed rather than defaulting.
    pub fn new(table: &CostTable) -> Result<Self, CostTableError> {
        let mut energy = [CostUnits::ZERO; Action::COUNT];
        for action in Action::ALL {
            energy[action.index()] = if action == Action::Up {
                up_energy()
            } else {
                table
                    .energy(action)
                    .ok_or(CostTableError::MissingEntry { action })?
            };
        }
        let edge = energy.map(|e| movement_units() + e);
        Ok(Self { energy, edge })
    }

    /// Energy term only (no movement cost), as used for battery accounting.
    #[must_use]
    pub fn energy(&self, action: Action) -> CostUnits {
        self.energy[action.index()]
    }
}

impl EdgeCostModel for EnergyCostModel {
    fn edge_cost(&self, action: Action) -> CostUnits {
        self.edge[action.index()]
    }

    fn model_id(&self) -> &str {
        "energy.v1"
    }
}

/// Every action costs [`MOVEMENT_COST`]. Baseline for comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformCostModel;

impl EdgeCostModel for UniformCostModel {
    fn edge_cost(&self, _action: Action) -> CostUnits {
        movement_units()
    }

    fn model_id(&self) -> &str {
        "uniform.v1"
    }
}

/// Per-action edge costs as a JSON object keyed by action name.
#[must_use]
pub fn edge_costs_json(model: &dyn EdgeCostModel) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for action in Action::ALL {
        map.insert(
            action.name().to_string(),
            serde_json::json!(model.edge_cost(action).units()),
        );
    }
    serde_json::Value::Object(map)
}
