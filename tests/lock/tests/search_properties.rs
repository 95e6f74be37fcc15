//! Search invariants checked over a sweep of goals.
//!
//! Proves:
//! 1. Every found route replays from start to goal
//! 2. Search is deterministic (identical graph digests across runs)
//! 3. `flip` never appears on a route
//! 4. No pose is expanded twice
//! 5. Route length is at least the Manhattan distance
//! 6. Bounded unreachable goals exhaust the frontier; tight budgets stop early
//! 7. Parallel searches sharing one cost model match sequential runs

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use lock_tests::missions::midpoint_energy;
use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::{EdgeCostModel, EnergyCostModel, UniformCostModel};
use skyroute_kernel::cost::table::CostTable;
use skyroute_search::graph::TerminationReason;
use skyroute_search::policy::{PoseBounds, SearchPolicy};
use skyroute_search::route::RouteOutcome;
use skyroute_search::search::search;

fn energy_model() -> EnergyCostModel {
    let table = CostTable::from_fn(midpoint_energy).unwrap();
    EnergyCostModel::new(&table).unwrap()
}

fn bounded_policy() -> SearchPolicy {
    SearchPolicy {
        max_expansions: 20_000,
        bounds: Some(PoseBounds::around(Pose::origin(), 4)),
        ..SearchPolicy::default()
    }
}

fn goal_sweep() -> Vec<Pose> {
    let mut goals = Vec::new();
    for x in [-2, 0, 3] {
        for y in [-1, 2] {
            for z in [0, 1] {
                for heading in [-1, 0, 2] {
                    goals.push(Pose::new(x, y, z, heading));
                }
            }
        }
    }
    goals
}

fn models() -> Vec<Box<dyn EdgeCostModel>> {
    vec![Box::new(energy_model()), Box::new(UniformCostModel)]
}

#[test]
fn found_routes_replay_to_goal() {
    let policy = bounded_policy();
    for model in models() {
        for goal in goal_sweep() {
            let result = search(Pose::origin(), goal, model.as_ref(), &policy).unwrap();
            assert_eq!(result.outcome(), RouteOutcome::Found, "goal {goal}");
            let route = result.route.unwrap();
            assert_eq!(route.replay().unwrap(), goal);
            assert!(route.verify().unwrap().is_match());
        }
    }
}

#[test]
fn search_is_deterministic() {
    let model = energy_model();
    let policy = bounded_policy();
    for goal in goal_sweep() {
        let a = search(Pose::origin(), goal, &model, &policy).unwrap();
        let b = search(Pose::origin(), goal, &model, &policy).unwrap();
        assert_eq!(a.graph.digest().unwrap(), b.graph.digest().unwrap());
        assert_eq!(a.route, b.route);
    }
}

#[test]
fn parallel_searches_share_one_model() {
    let model = Arc::new(energy_model());
    let policy = bounded_policy();
    let goals: Vec<Pose> = (1..=4).map(|n| Pose::new(n, -1, 0, 1)).collect();

    let sequential: Vec<_> = goals
        .iter()
        .map(|&goal| {
            let result = search(Pose::origin(), goal, model.as_ref(), &policy).unwrap();
            (result.route, result.graph.digest().unwrap())
        })
        .collect();

    let handles: Vec<_> = goals
        .iter()
        .map(|&goal| {
            let model = Arc::clone(&model);
            let policy = policy.clone();
            thread::spawn(move || {
                let result = search(Pose::origin(), goal, model.as_ref(), &policy).unwrap();
                (result.route, result.graph.digest().unwrap())
            })
        })
        .collect();
    let parallel: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(parallel, sequential);
    let lengths: Vec<usize> = parallel
        .iter()
        .map(|(route, _)| route.as_ref().unwrap().len())
        .collect();
    assert_eq!(lengths, vec![3, 4, 5, 6]);
}

#[test]
fn flip_never_routes() {
    let policy = bounded_policy();
    for model in models() {
        for goal in goal_sweep() {
            let result = search(Pose::origin(), goal, model.as_ref(), &policy).unwrap();
            let route = result.route.unwrap();
            assert!(
                !route.actions.contains(&Action::Flip),
                "flip on route to {goal}"
            );
        }
    }
}

#[test]
fn no_pose_expanded_twice() {
    let model = energy_model();
    let policy = bounded_policy();
    for goal in goal_sweep() {
        let result = search(Pose::origin(), goal, &model, &policy).unwrap();
        let mut seen = BTreeSet::new();
        for event in &result.graph.expansions {
            assert!(seen.insert(event.pose), "pose {} expanded twice", event.pose);
        }
    }
}

#[test]
fn route_length_at_least_manhattan() {
    let model = energy_model();
    let policy = bounded_policy();
    for goal in goal_sweep() {
        let result = search(Pose::origin(), goal, &model, &policy).unwrap();
        let route = result.route.unwrap();
        let distance = Pose::origin().manhattan_distance(&goal);
        assert!(route.len() as u64 >= distance, "goal {goal}");
    }
}

#[test]
fn start_equals_goal_is_empty_route() {
    let model = energy_model();
    let start = Pose::new(1, 1, 1, 1);
    let result = search(start, start, &model, &SearchPolicy::default()).unwrap();
    assert_eq!(result.outcome(), RouteOutcome::Found);
    assert!(result.route.unwrap().is_empty());
    assert_eq!(result.graph.metadata.total_expansions, 0);
}

#[test]
fn goal_outside_bounds_exhausts_frontier() {
    let model = energy_model();
    let policy = SearchPolicy {
        bounds: Some(PoseBounds::around(Pose::origin(), 1)),
        ..SearchPolicy::default()
    };
    let result = search(Pose::origin(), Pose::new(5, 0, 0, 0), &model, &policy).unwrap();
    assert_eq!(result.outcome(), RouteOutcome::NotFound);
    assert!(result.route.is_none());
    // 3^4 poses in the box.
    assert_eq!(result.graph.metadata.total_expansions, 81);
    assert_eq!(
        result.graph.metadata.termination_reason,
        TerminationReason::FrontierExhausted
    );
}

#[test]
fn tight_budget_stops_search() {
    let model = energy_model();
    let policy = SearchPolicy {
        max_expansions: 3,
        ..SearchPolicy::default()
    };
    let result = search(Pose::origin(), Pose::new(9, 9, 9, 9), &model, &policy).unwrap();
    assert_eq!(result.outcome(), RouteOutcome::BudgetExceeded);
    assert!(result.route.is_none());
    assert_eq!(result.graph.metadata.total_expansions, 3);
    assert_eq!(result.graph.expansions.len(), 3);
}
