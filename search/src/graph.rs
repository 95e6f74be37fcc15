//! `SearchGraph`: expansion-event audit log.
//!
//! The normative decision surface is the ordered list of `ExpandEvent`
//! entries. Node summaries are a derived index for path reconstruction.
//! Everything is integer-valued so the canonical JSON form is
//! byte-identical across runs, processes and machines.

use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::{Axis, Pose};
use skyroute_kernel::cost::units::CostUnits;
use skyroute_kernel::proof::canon::{append_canonical_json, CanonError};
use skyroute_kernel::proof::hash::{canonical_hash, ContentHash};
use skyroute_kernel::proof::hash_domain::HashDomain;

use crate::node::FrontierKey;

const SCHEMA_VERSION: &str = "search_graph.v1";

/// The complete search audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchGraph {
    /// Ordered expansion events (normative decision surface).
    pub expansions: Vec<ExpandEvent>,
    /// Derived node index sorted by `node_id` ascending.
    pub node_summaries: Vec<NodeSummary>,
    pub metadata: SearchGraphMetadata,
}

/// One frontier pop that led to an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandEvent {
    /// Total order of expansions.
    pub expansion_order: u64,
    pub node_id: u64,
    pub pose: Pose,
    /// The frontier key at time of pop.
    pub frontier_pop_key: FrontierKey,
    /// One record per routing action, in `Action::ALL` order.
    pub candidates: Vec<CandidateRecord>,
}

/// A candidate action with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub action: Action,
    /// `None` if applying the action failed.
    pub child_pose: Option<Pose>,
    pub edge_cost: CostUnits,
    /// `None` if applying the action failed.
    pub f_cost: Option<CostUnits>,
    pub outcome: CandidateOutcome,
}

/// What happened to a candidate during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// A new node was created and pushed.
    Pushed { to_node: u64 },
    /// The child pose is already closed; it could only ever pop stale.
    ClosedSuppressed,
    /// Kernel `apply()` failed.
    ApplyFailed(ApplyFailureKind),
    /// Child would exceed `max_depth`.
    SkippedByDepthLimit,
    /// Child `f` exceeds `max_f_cost`.
    SkippedByCostCeiling,
    /// Child pose lies outside the policy bounds.
    SkippedOutOfBounds,
}

/// Mirror of kernel `ApplyFailure` variants for graph serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyFailureKind {
    AxisOverflow { axis: Axis },
}

/// Derived node summary for path reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub node_id: u64,
    pub parent_id: Option<u64>,
    pub producing_action: Option<Action>,
    pub pose: Pose,
    pub depth: u32,
    pub f_cost: CostUnits,
    pub is_goal: bool,
    /// Set if the node was expanded.
    pub expansion_order: Option<u64>,
}

/// Aggregate counters, bindings and policy echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchGraphMetadata {
    pub start: Pose,
    pub goal: Pose,
    /// Hex fingerprint of the start pose.
    pub root_fingerprint: String,
    pub model_id: String,
    /// Edge cost of every routing action, `Action::ALL` order.
    pub edge_costs: Vec<(Action, CostUnits)>,
    pub policy: serde_json::Value,

    pub total_expansions: u64,
    pub total_candidates_generated: u64,
    pub total_closed_suppressed: u64,
    pub total_stale_pops: u64,
    pub total_apply_failures: u64,
    pub total_skipped_depth: u64,
    pub total_skipped_cost: u64,
    pub total_skipped_bounds: u64,
    pub frontier_high_water: u64,
    pub termination_reason: TerminationReason,
}

/// Why the search terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The goal pose was popped.
    GoalReached { node_id: u64 },
    /// Frontier emptied without reaching the goal.
    FrontierExhausted,
    /// `max_expansions` budget was hit.
    ExpansionBudgetExceeded,
}

impl SearchGraph {
    /// Canonical JSON bytes of the whole graph.
    ///
    /// Written one record at a time: byte-identical to canonicalizing
    /// [`SearchGraph::to_json_value`], without ever holding the full value
    /// tree.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails. The graph holds only
    /// integers, so this does not happen in practice.
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        let mut out = Vec::with_capacity(256 * (self.expansions.len() + 1));
        out.extend_from_slice(b"{\"expansions\":[");
        for (i, event) in self.expansions.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            append_canonical_json(&mut out, &expand_event_to_json(event))?;
        }
        out.extend_from_slice(b"],\"metadata\":");
        append_canonical_json(&mut out, &metadata_to_json(&self.metadata))?;
        out.extend_from_slice(b",\"node_summaries\":[");
        for (i, node) in self.node_summaries.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            append_canonical_json(&mut out, &node_summary_to_json(node))?;
        }
        out.extend_from_slice(b"],\"schema_version\":");
        append_canonical_json(&mut out, &serde_json::json!(SCHEMA_VERSION))?;
        out.push(b'}');
        Ok(out)
    }

    /// Content hash of the canonical bytes.
    ///
    /// # Errors
    ///
    /// See [`SearchGraph::to_canonical_json_bytes`].
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        Ok(canonical_hash(
            HashDomain::SearchGraph,
            &self.to_canonical_json_bytes()?,
        ))
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "expansions": self.expansions.iter().map(expand_event_to_json).collect::<Vec<_>>(),
            "metadata": metadata_to_json(&self.metadata),
            "node_summaries": self.node_summaries.iter().map(node_summary_to_json).collect::<Vec<_>>(),
            "schema_version": SCHEMA_VERSION,
        })
    }

    /// Popped `f` values of the expansions, in order.
    #[must_use]
    pub fn expansion_f_costs(&self) -> Vec<CostUnits> {
        self.expansions
            .iter()
            .map(|e| e.frontier_pop_key.f_cost)
            .collect()
    }
}

fn expand_event_to_json(e: &ExpandEvent) -> serde_json::Value {
    serde_json::json!({
        "candidates": e.candidates.iter().map(candidate_record_to_json).collect::<Vec<_>>(),
        "expansion_order": e.expansion_order,
        "frontier_pop_key": e.frontier_pop_key.to_json_value(),
        "node_id": e.node_id,
        "pose": e.pose.to_json_value(),
    })
}

fn candidate_record_to_json(r: &CandidateRecord) -> serde_json::Value {
    serde_json::json!({
        "action": r.action.name(),
        "child_pose": r.child_pose.as_ref().map(Pose::to_json_value),
        "edge_cost": r.edge_cost.units(),
        "f_cost": r.f_cost.map(CostUnits::units),
        "outcome": outcome_to_json(r.outcome),
    })
}

fn outcome_to_json(o: CandidateOutcome) -> serde_json::Value {
    match o {
        CandidateOutcome::Pushed { to_node } => {
            serde_json::json!({"to_node": to_node, "type": "pushed"})
        }
        CandidateOutcome::ClosedSuppressed => serde_json::json!({"type": "closed_suppressed"}),
        CandidateOutcome::ApplyFailed(ApplyFailureKind::AxisOverflow { axis }) => {
            serde_json::json!({"axis": axis.name(), "kind": "axis_overflow", "type": "apply_failed"})
        }
        CandidateOutcome::SkippedByDepthLimit => {
            serde_json::json!({"type": "skipped_by_depth_limit"})
        }
        CandidateOutcome::SkippedByCostCeiling => {
            serde_json::json!({"type": "skipped_by_cost_ceiling"})
        }
        CandidateOutcome::SkippedOutOfBounds => {
            serde_json::json!({"type": "skipped_out_of_bounds"})
        }
    }
}

fn node_summary_to_json(n: &NodeSummary) -> serde_json::Value {
    serde_json::json!({
        "depth": n.depth,
        "expansion_order": n.expansion_order,
        "f_cost": n.f_cost.units(),
        "is_goal": n.is_goal,
        "node_id": n.node_id,
        "parent_id": n.parent_id,
        "pose": n.pose.to_json_value(),
        "producing_action": n.producing_action.map(Action::name),
    })
}

fn metadata_to_json(m: &SearchGraphMetadata) -> serde_json::Value {
    let edge_costs: serde_json::Map<String, serde_json::Value> = m
        .edge_costs
        .iter()
        .map(|(a, c)| (a.name().to_string(), serde_json::json!(c.units())))
        .collect();
    serde_json::json!({
        "edge_costs": edge_costs,
        "frontier_high_water": m.frontier_high_water,
        "goal": m.goal.to_json_value(),
        "model_id": m.model_id,
        "policy": m.policy,
        "root_fingerprint": m.root_fingerprint,
        "start": m.start.to_json_value(),
        "termination_reason": termination_reason_to_json(m.termination_reason),
        "total_apply_failures": m.total_apply_failures,
        "total_candidates_generated": m.total_candidates_generated,
        "total_closed_suppressed": m.total_closed_suppressed,
        "total_expansions": m.total_expansions,
        "total_skipped_bounds": m.total_skipped_bounds,
        "total_skipped_cost": m.total_skipped_cost,
        "total_skipped_depth": m.total_skipped_depth,
        "total_stale_pops": m.total_stale_pops,
    })
}

/// JSON form of a termination reason.
#[must_use]
pub fn termination_reason_to_json(r: TerminationReason) -> serde_json::Value {
    match r {
        TerminationReason::GoalReached { node_id } => {
            serde_json::json!({"node_id": node_id, "type": "goal_reached"})
        }
        TerminationReason::FrontierExhausted => serde_json::json!({"type": "frontier_exhausted"}),
        TerminationReason::ExpansionBudgetExceeded => {
            serde_json::json!({"type": "expansion_budget_exceeded"})
        }
    }
}
