//! Search nodes and the frontier ordering key.

use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::units::CostUnits;
use skyroute_kernel::proof::hash::{canonical_hash, ContentHash};
use skyroute_kernel::proof::hash_domain::HashDomain;

/// An immutable search node.
///
/// `f_cost = g_cost + h_cost + edge_cost`, where `g_cost` is the depth in
/// steps, `h_cost` the Manhattan distance to the goal in steps, and
/// `edge_cost` the model cost of `producing_action` (zero for the root).
/// The edge term is counted on top of `g`, not instead of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    /// Monotonic node identifier; also the node's index in the arena.
    pub node_id: u64,
    /// Parent node ID (`None` for root).
    pub parent_id: Option<u64>,
    pub pose: Pose,
    /// Tree depth (root = 0). Equals the number of actions on the path.
    pub depth: u32,
    pub g_cost: CostUnits,
    pub h_cost: CostUnits,
    pub edge_cost: CostUnits,
    /// Global counter for deterministic tie-breaking.
    pub creation_order: u64,
    /// The action that produced this node from its parent.
    pub producing_action: Option<Action>,
}

impl SearchNode {
    /// The frontier ordering value.
    #[must_use]
    pub fn f_cost(&self) -> CostUnits {
        self.g_cost + self.h_cost + self.edge_cost
    }

    #[must_use]
    pub fn frontier_key(&self) -> FrontierKey {
        FrontierKey {
            f_cost: self.f_cost(),
            depth: self.depth,
            creation_order: self.creation_order,
        }
    }
}

/// Heuristic term: Manhattan distance to `goal`, in step units.
#[must_use]
pub fn heuristic(pose: &Pose, goal: &Pose) -> CostUnits {
    CostUnits::from_steps(pose.manhattan_distance(goal))
}

/// Fingerprint of a pose under the search-node domain.
#[must_use]
pub fn pose_fingerprint(pose: &Pose) -> ContentHash {
    canonical_hash(HashDomain::SearchNode, &pose.identity_bytes())
}

/// The frontier ordering key: `(f_cost, depth, creation_order)`.
///
/// Lower `f_cost` first, then shallower depth, then older `creation_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierKey {
    pub f_cost: CostUnits,
    pub depth: u32,
    pub creation_order: u64,
}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.f_cost
            .cmp(&other.f_cost)
            .then(self.depth.cmp(&other.depth))
            .then(self.creation_order.cmp(&other.creation_order))
    }
}

impl FrontierKey {
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "creation_order": self.creation_order,
            "depth": self.depth,
            "f_cost": self.f_cost.units(),
        })
    }
}
