//! Search entry point and expansion loop.
//!
//! Best-first over poses with `f = g + h + c`. The heuristic is not
//! admissible and closed poses are never reopened, so the returned route is
//! the first one the ordering discovers, not necessarily the cheapest.

use log::{debug, warn};

use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::EdgeCostModel;
use skyroute_kernel::cost::units::CostUnits;
use skyroute_kernel::operators::apply::{apply, ApplyFailure};

use crate::error::SearchError;
use crate::frontier::BestFirstFrontier;
use crate::graph::{
    ApplyFailureKind, CandidateOutcome, CandidateRecord, ExpandEvent, NodeSummary, SearchGraph,
    SearchGraphMetadata, TerminationReason,
};
use crate::node::{heuristic, pose_fingerprint, SearchNode};
use crate::policy::SearchPolicy;
use crate::route::{Route, RouteOutcome};

/// Result of a search execution.
///
/// Always carries the complete audit graph, however the search ended.
#[derive(Debug)]
pub struct SearchResult {
    /// The route, if the goal was reached.
    pub route: Option<Route>,
    pub graph: SearchGraph,
    /// Every node created, indexed by `node_id`.
    pub nodes: Vec<SearchNode>,
}

impl SearchResult {
    #[must_use]
    pub fn outcome(&self) -> RouteOutcome {
        match self.graph.metadata.termination_reason {
            TerminationReason::GoalReached { .. } => RouteOutcome::Found,
            TerminationReason::FrontierExhausted => RouteOutcome::NotFound,
            TerminationReason::ExpansionBudgetExceeded => RouteOutcome::BudgetExceeded,
        }
    }

    #[must_use]
    pub fn is_goal_reached(&self) -> bool {
        self.route.is_some()
    }
}

#[derive(Debug, Default)]
struct Counters {
    candidates_generated: u64,
    closed_suppressed: u64,
    stale_pops: u64,
    apply_failures: u64,
    skipped_depth: u64,
    skipped_cost: u64,
    skipped_bounds: u64,
}

/// Run best-first search from `start` to `goal`.
///
/// Each iteration pops the lowest `(f, depth, creation_order)` entry, drops
/// it if its pose is already closed, stops if it is the goal, stops if the
/// expansion budget is spent, and otherwise closes the pose and expands all
/// nine routing actions in `Action::ALL` order.
///
/// # Errors
///
/// Returns [`SearchError`] only for pre-flight policy failures. Goal, empty
/// frontier and budget exhaustion all return `Ok` with the audit graph.
pub fn search(
    start: Pose,
    goal: Pose,
    model: &dyn EdgeCostModel,
    policy: &SearchPolicy,
) -> Result<SearchResult, SearchError> {
    policy.validate(&start)?;

    let edge_costs: Vec<(Action, CostUnits)> =
        Action::ALL.iter().map(|&a| (a, model.edge_cost(a))).collect();

    let mut frontier = BestFirstFrontier::new();
    let mut nodes: Vec<SearchNode> = Vec::new();
    let mut expansions: Vec<ExpandEvent> = Vec::new();
    let mut counters = Counters::default();
    let mut expansion_count: u64 = 0;

    let root = SearchNode {
        node_id: 0,
        parent_id: None,
        pose: start,
        depth: 0,
        g_cost: CostUnits::ZERO,
        h_cost: heuristic(&start, &goal),
        edge_cost: CostUnits::ZERO,
        creation_order: 0,
        producing_action: None,
    };
    frontier.push(root.frontier_key(), root.node_id);
    nodes.push(root);

    let termination_reason = loop {
        let Some((pop_key, node_id)) = frontier.pop() else {
            break TerminationReason::FrontierExhausted;
        };
        let Some(current) = node_at(&nodes, node_id).cloned() else {
            break TerminationReason::FrontierExhausted;
        };

        if frontier.is_closed(&current.pose) {
            counters.stale_pops += 1;
            continue;
        }
        if current.pose == goal {
            break TerminationReason::GoalReached { node_id };
        }
        if expansion_count >= policy.max_expansions {
            break TerminationReason::ExpansionBudgetExceeded;
        }

        frontier.close(current.pose);

        let mut candidates = Vec::with_capacity(Action::COUNT);
        for &(action, edge_cost) in &edge_costs {
            counters.candidates_generated += 1;
            let record = expand_candidate(
                &current,
                action,
                edge_cost,
                goal,
                policy,
                &mut frontier,
                &mut nodes,
                &mut counters,
            );
            candidates.push(record);
        }

        expansions.push(ExpandEvent {
            expansion_order: expansion_count,
            node_id,
            pose: current.pose,
            frontier_pop_key: pop_key,
            candidates,
        });
        expansion_count += 1;
    };

    match termination_reason {
        TerminationReason::GoalReached { node_id } => debug!(
            "search {start} -> {goal}: goal node {node_id} after {expansion_count} expansions"
        ),
        TerminationReason::FrontierExhausted => debug!(
            "search {start} -> {goal}: frontier exhausted after {expansion_count} expansions"
        ),
        TerminationReason::ExpansionBudgetExceeded => warn!(
            "search {start} -> {goal}: expansion budget of {} exhausted",
            policy.max_expansions
        ),
    }

    let route = match termination_reason {
        TerminationReason::GoalReached { node_id } => Some(Route {
            start,
            goal,
            actions: reconstruct_actions(&nodes, node_id),
        }),
        _ => None,
    };

    let metadata = SearchGraphMetadata {
        start,
        goal,
        root_fingerprint: pose_fingerprint(&start).hex_digest().to_string(),
        model_id: model.model_id().to_string(),
        edge_costs,
        policy: policy.to_json_value(),
        total_expansions: expansion_count,
        total_candidates_generated: counters.candidates_generated,
        total_closed_suppressed: counters.closed_suppressed,
        total_stale_pops: counters.stale_pops,
        total_apply_failures: counters.apply_failures,
        total_skipped_depth: counters.skipped_depth,
        total_skipped_cost: counters.skipped_cost,
        total_skipped_bounds: counters.skipped_bounds,
        frontier_high_water: frontier.high_water(),
        termination_reason,
    };
    let graph = build_graph(expansions, &nodes, metadata);

    Ok(SearchResult {
        route,
        graph,
        nodes,
    })
}

/// Apply one action to `current` and decide what becomes of the child.
#[allow(clippy::too_many_arguments)]
fn expand_candidate(
    current: &SearchNode,
    action: Action,
    edge_cost: CostUnits,
    goal: Pose,
    policy: &SearchPolicy,
    frontier: &mut BestFirstFrontier,
    nodes: &mut Vec<SearchNode>,
    counters: &mut Counters,
) -> CandidateRecord {
    let child_depth = current.depth.saturating_add(1);
    let mut record = CandidateRecord {
        action,
        child_pose: None,
        edge_cost,
        f_cost: None,
        outcome: CandidateOutcome::SkippedByDepthLimit,
    };

    if policy.max_depth.is_some_and(|max| child_depth > max) {
        counters.skipped_depth += 1;
        return record;
    }

    let child_pose = match apply(current.pose, action) {
        Ok(pose) => pose,
        Err(ApplyFailure::AxisOverflow { axis, .. }) => {
            counters.apply_failures += 1;
            record.outcome = CandidateOutcome::ApplyFailed(ApplyFailureKind::AxisOverflow { axis });
            return record;
        }
    };

    let g_cost = CostUnits::from_steps(u64::from(child_depth));
    let h_cost = heuristic(&child_pose, &goal);
    let f_cost = g_cost + h_cost + edge_cost;
    record.child_pose = Some(child_pose);
    record.f_cost = Some(f_cost);

    if policy.bounds.is_some_and(|b| !b.contains(&child_pose)) {
        counters.skipped_bounds += 1;
        record.outcome = CandidateOutcome::SkippedOutOfBounds;
        return record;
    }
    if frontier.is_closed(&child_pose) {
        counters.closed_suppressed += 1;
        record.outcome = CandidateOutcome::ClosedSuppressed;
        return record;
    }
    if policy.max_f_cost.is_some_and(|ceiling| f_cost > ceiling) {
        counters.skipped_cost += 1;
        record.outcome = CandidateOutcome::SkippedByCostCeiling;
        return record;
    }

    let node_id = nodes.len() as u64;
    let child = SearchNode {
        node_id,
        parent_id: Some(current.node_id),
        pose: child_pose,
        depth: child_depth,
        g_cost,
        h_cost,
        edge_cost,
        creation_order: node_id,
        producing_action: Some(action),
    };
    frontier.push(child.frontier_key(), node_id);
    nodes.push(child);
    record.outcome = CandidateOutcome::Pushed { to_node: node_id };
    record
}

fn node_at(nodes: &[SearchNode], node_id: u64) -> Option<&SearchNode> {
    usize::try_from(node_id).ok().and_then(|i| nodes.get(i))
}

/// Walk parent links from `goal_node_id` back to the root and return the
/// producing actions in root-to-goal order.
#[must_use]
pub fn reconstruct_actions(nodes: &[SearchNode], goal_node_id: u64) -> Vec<Action> {
    let mut actions = Vec::new();
    let mut current = node_at(nodes, goal_node_id);
    while let Some(node) = current {
        if let Some(action) = node.producing_action {
            actions.push(action);
        }
        current = node.parent_id.and_then(|id| node_at(nodes, id));
    }
    actions.reverse();
    actions
}

fn build_graph(
    expansions: Vec<ExpandEvent>,
    nodes: &[SearchNode],
    metadata: SearchGraphMetadata,
) -> SearchGraph {
    let mut expansion_of: Vec<Option<u64>> = vec![None; nodes.len()];
    for e in &expansions {
        if let Some(slot) = usize::try_from(e.node_id).ok().and_then(|i| expansion_of.get_mut(i)) {
            *slot = Some(e.expansion_order);
        }
    }
    let goal_id = match metadata.termination_reason {
        TerminationReason::GoalReached { node_id } => Some(node_id),
        _ => None,
    };

    // Arena order is node_id order.
    let node_summaries = nodes
        .iter()
        .zip(expansion_of)
        .map(|(n, expansion_order)| NodeSummary {
            node_id: n.node_id,
            parent_id: n.parent_id,
            producing_action: n.producing_action,
            pose: n.pose,
            depth: n.depth,
            f_cost: n.f_cost(),
            is_goal: goal_id == Some(n.node_id),
            expansion_order,
        })
        .collect();

    SearchGraph {
        expansions,
        node_summaries,
        metadata,
    }
}
