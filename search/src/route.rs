//! `Route`: the action sequence a search returns, and its outcome tag.

use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::EdgeCostModel;
use skyroute_kernel::cost::units::CostUnits;
use skyroute_kernel::proof::replay::{replay_route, verify_route, ReplayError, ReplayVerdict};

/// An ordered action sequence from `start` to `goal`.
///
/// Empty when `start == goal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub start: Pose,
    pub goal: Pose,
    pub actions: Vec<Action>,
}

impl Route {
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// The pose the actions lead to from `start`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if a step overflows.
    pub fn replay(&self) -> Result<Pose, ReplayError> {
        replay_route(self.start, &self.actions)
    }

    /// Replay and compare with `goal`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if a step overflows.
    pub fn verify(&self) -> Result<ReplayVerdict, ReplayError> {
        verify_route(self.start, self.goal, &self.actions)
    }

    /// Sum of the model's edge costs along the route.
    #[must_use]
    pub fn edge_cost_total(&self, model: &dyn EdgeCostModel) -> CostUnits {
        self.actions.iter().map(|&a| model.edge_cost(a)).sum()
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "actions": self.action_names(),
            "goal": self.goal.to_json_value(),
            "start": self.start.to_json_value(),
        })
    }
}

/// How a search call ended, from the caller's point of view.
///
/// `NotFound` and `BudgetExceeded` are normal returns, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Found,
    /// The reachable space (under the policy's bounds and cutoffs) holds
    /// no goal.
    NotFound,
    /// The expansion budget ran out first.
    BudgetExceeded,
}

impl RouteOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::BudgetExceeded => "budget_exceeded",
        }
    }
}

impl std::fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
