//! Mission runner: cost table, search, replay, simulated flight, bundle.
//!
//! # Pipeline
//!
//! ```text
//! MissionConfig → search_policy() → resolve cost table → EnergyCostModel
//!   → search() → verify route replay → SimulatedDrone::fly_route()
//!   → canonical JSON artifacts → build_bundle()
//! ```
//!
//! Everything up to `EnergyCostModel` is configuration; any failure there
//! aborts before the search starts. `NotFound` and `BudgetExceeded` are
//! outcomes, not errors: they still produce a bundle with the audit graph.

use std::fmt;

use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::{EdgeCostModel, EnergyCostModel};
use skyroute_kernel::cost::table::{CostTable, CostTableError};
use skyroute_kernel::proof::canon::canonical_json_bytes;
use skyroute_kernel::proof::hash::canonical_json_hash;
use skyroute_kernel::proof::hash_domain::HashDomain;
use skyroute_kernel::proof::replay::{ReplayError, ReplayVerdict};
use skyroute_search::error::SearchError;
use skyroute_search::graph::termination_reason_to_json;
use skyroute_search::policy::SearchPolicy;
use skyroute_search::route::{Route, RouteOutcome};
use skyroute_search::search::{search, SearchResult};

use crate::bundle::{
    artifact_hash, build_bundle, ArtifactBundleV1, ArtifactInput, BundleBuildError,
    COST_TABLE_ARTIFACT, FLIGHT_REPORT_ARTIFACT, ROUTE_PLAN_ARTIFACT, SEARCH_GRAPH_ARTIFACT,
    SEARCH_POLICY_ARTIFACT,
};
use crate::config::{ConfigError, CostSource, MissionConfig};
use crate::drone::{DroneError, FlightReport, SimulatedDrone};
use crate::telemetry::{load_flight_logs, parse_average_csv, ConsumptionSummary, TelemetryError};

#[derive(Debug)]
pub enum MissionError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    CostTable(CostTableError),
    Search(SearchError),
    /// The found route did not replay onto the goal.
    RouteDiverged { expected: Pose, actual: Pose },
    Replay(ReplayError),
    Drone(DroneError),
    CanonFailed { detail: String },
    Bundle(BundleBuildError),
}

impl fmt::Display for MissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::CostTable(e) => write!(f, "{e}"),
            Self::Search(e) => write!(f, "search: {e}"),
            Self::RouteDiverged { expected, actual } => {
                write!(f, "route replays to {actual}, expected {expected}")
            }
            Self::Replay(e) => write!(f, "replay: {e}"),
            Self::Drone(e) => write!(f, "flight: {e}"),
            Self::CanonFailed { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::Bundle(e) => write!(f, "bundle: {e}"),
        }
    }
}

impl std::error::Error for MissionError {}

macro_rules! mission_error_from {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for MissionError {
                fn from(e: $source) -> Self {
                    Self::$variant(e)
                }
            }
        )+
    };
}

mission_error_from! {
    ConfigError => Config,
    TelemetryError => Telemetry,
    CostTableError => CostTable,
    SearchError => Search,
    ReplayError => Replay,
    DroneError => Drone,
    BundleBuildError => Bundle,
}

/// Everything a mission run produced.
#[derive(Debug)]
pub struct MissionReport {
    pub start: Pose,
    pub goal: Pose,
    pub cost_table: CostTable,
    pub search: SearchResult,
    /// Present when a route was found.
    pub flight: Option<FlightReport>,
    pub bundle: ArtifactBundleV1,
}

impl MissionReport {
    #[must_use]
    pub fn outcome(&self) -> RouteOutcome {
        self.search.outcome()
    }

    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.search.route.as_ref()
    }
}

/// A cost table and a hashable description of where it came from.
///
/// File paths are left out of the description; telemetry is identified by
/// the content hashes of its flight logs.
///
/// # Errors
///
/// Returns [`MissionError`] if the source cannot be read or does not yield
/// a complete table.
pub fn resolve_cost_table(
    config: &MissionConfig,
) -> Result<(CostTable, serde_json::Value), MissionError> {
    match config.cost_source()? {
        CostSource::Inline(entries) => {
            let table = CostTable::from_entries(entries)?;
            Ok((table, serde_json::json!({"kind": "inline"})))
        }
        CostSource::AveragesCsv(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| TelemetryError::Io {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let averages = parse_average_csv(&text).map_err(|error| TelemetryError::InFile {
                path: path.display().to_string(),
                error: Box::new(error),
            })?;
            let table = CostTable::from_entries(averages.iter().map(|(c, v)| (c.name(), *v)))?;
            Ok((table, serde_json::json!({"kind": "averages_csv"})))
        }
        CostSource::TelemetryDir(dir) => {
            let logs = load_flight_logs(&dir)?;
            let table = ConsumptionSummary::from_logs(&logs).to_cost_table()?;
            let hashes: Vec<String> = logs
                .iter()
                .map(|log| log.content_hash().as_str().to_string())
                .collect();
            log::info!("averaged {} flight logs from {}", logs.len(), dir.display());
            Ok((
                table,
                serde_json::json!({"flight_logs": hashes, "kind": "telemetry"}),
            ))
        }
    }
}

/// Plan, verify and fly one mission, and bundle the evidence.
///
/// # Errors
///
/// Returns [`MissionError`] for configuration, telemetry and cost-table
/// problems (before searching), and for replay, flight or bundling failures
/// after it.
pub fn plan_mission(config: &MissionConfig) -> Result<MissionReport, MissionError> {
    let policy = config.search_policy()?;
    let (cost_table, cost_source) = resolve_cost_table(config)?;
    let model = EnergyCostModel::new(&cost_table)?;
    let (start, goal) = (config.start_pose(), config.goal_pose());

    log::info!(
        "planning {start} -> {goal} with {} (budget {} expansions)",
        model.model_id(),
        policy.max_expansions
    );
    let result = search(start, goal, &model, &policy)?;
    log::info!(
        "search finished: {} after {} expansions",
        result.outcome(),
        result.graph.metadata.total_expansions
    );

    let flight = match &result.route {
        Some(route) => {
            if let ReplayVerdict::Divergence { expected, actual } = route.verify()? {
                return Err(MissionError::RouteDiverged { expected, actual });
            }
            let mut drone = SimulatedDrone::new(&cost_table)?;
            let report = drone.fly_route(route)?;
            log::info!(
                "flew {} actions: {}% used, {}% left",
                route.len(),
                report.energy_used,
                report.battery_remaining
            );
            Some(report)
        }
        None => None,
    };

    let bundle = bundle_mission(
        &cost_table,
        cost_source,
        &policy,
        &model,
        &result,
        flight.as_ref(),
    )?;
    log::info!("bundle digest {}", bundle.digest);

    Ok(MissionReport {
        start,
        goal,
        cost_table,
        search: result,
        flight,
        bundle,
    })
}

fn bundle_mission(
    cost_table: &CostTable,
    cost_source: serde_json::Value,
    policy: &SearchPolicy,
    model: &dyn EdgeCostModel,
    result: &SearchResult,
    flight: Option<&FlightReport>,
) -> Result<ArtifactBundleV1, MissionError> {
    let cost_bytes = canonical(&cost_table.to_json_value())?;
    let policy_bytes = canonical(&policy.to_json_value())?;
    let graph_bytes = result
        .graph
        .to_canonical_json_bytes()
        .map_err(|e| MissionError::CanonFailed {
            detail: e.to_string(),
        })?;

    let route_json = result.route.as_ref().map(Route::to_json_value);
    let route_digest = route_json
        .as_ref()
        .map(|r| canonical_json_hash(HashDomain::RoutePlan, r))
        .transpose()
        .map_err(|e| MissionError::CanonFailed {
            detail: e.to_string(),
        })?;
    let cost_table_id = cost_table.digest().map_err(|e| MissionError::CanonFailed {
        detail: e.to_string(),
    })?;
    let metadata = &result.graph.metadata;

    let plan = serde_json::json!({
        "cost_source": cost_source,
        "cost_table_digest": artifact_hash(&cost_bytes).as_str(),
        "cost_table_id": cost_table_id.as_str(),
        "edge_cost_total": result.route.as_ref().map(|r| r.edge_cost_total(model).units()),
        "goal": metadata.goal.to_json_value(),
        "model_id": model.model_id(),
        "outcome": result.outcome().as_str(),
        "policy_digest": artifact_hash(&policy_bytes).as_str(),
        "route": route_json,
        "route_digest": route_digest.as_ref().map(|d| d.as_str().to_string()),
        "schema_version": "route_plan.v1",
        "search_graph_digest": artifact_hash(&graph_bytes).as_str(),
        "start": metadata.start.to_json_value(),
        "termination_reason": termination_reason_to_json(metadata.termination_reason),
        "total_expansions": metadata.total_expansions,
    });
    let plan_bytes = canonical(&plan)?;

    let mut inputs: Vec<ArtifactInput> = vec![
        normative(COST_TABLE_ARTIFACT, cost_bytes),
        normative(SEARCH_POLICY_ARTIFACT, policy_bytes),
        normative(SEARCH_GRAPH_ARTIFACT, graph_bytes),
        normative(ROUTE_PLAN_ARTIFACT, plan_bytes),
    ];
    if let Some(report) = flight {
        inputs.push(ArtifactInput::from((
            FLIGHT_REPORT_ARTIFACT.to_string(),
            canonical(&report.to_json_value())?,
            false,
        )));
    }
    Ok(build_bundle(inputs)?)
}

fn normative(name: &str, content: Vec<u8>) -> ArtifactInput {
    ArtifactInput {
        name: name.to_string(),
        precomputed_hash: Some(artifact_hash(&content)),
        content,
        normative: true,
    }
}

fn canonical(value: &serde_json::Value) -> Result<Vec<u8>, MissionError> {
    canonical_json_bytes(value).map_err(|e| MissionError::CanonFailed {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::verify_bundle;
    use crate::synth::write_synthetic_logs;
    use crate::telemetry::{render_average_csv, CSV_HEADER};
    use skyroute_kernel::carrier::action::Action;
    use std::collections::BTreeMap;

    fn inline_config(goal: [i64; 4]) -> MissionConfig {
        let mut cost_entries: BTreeMap<String, f64> = Action::ALL
            .into_iter()
            .filter(|a| *a != Action::Up)
            .map(|a| (a.name().to_string(), 1.0))
            .collect();
        cost_entries.insert("takeoff".into(), 5.0);
        cost_entries.insert("land".into(), 3.0);
        MissionConfig {
            goal,
            cost_entries,
            ..MissionConfig::default()
        }
    }

    fn plan_json(report: &MissionReport) -> serde_json::Value {
        serde_json::from_slice(&report.bundle.get(ROUTE_PLAN_ARTIFACT).unwrap().content).unwrap()
    }

    #[test]
    fn found_route_is_flown_and_bundled() {
        let report = plan_mission(&inline_config([2, 0, 0, 0])).unwrap();
        assert_eq!(report.outcome(), RouteOutcome::Found);
        assert_eq!(report.route().unwrap().actions, vec![Action::Forward, Action::Forward]);

        let flight = report.flight.as_ref().unwrap();
        assert_eq!(flight.final_pose, Pose::new(2, 0, 0, 0));
        assert_eq!(flight.energy_used.units(), 10_000_000);

        verify_bundle(&report.bundle).unwrap();
        let names: Vec<&str> = report.bundle.artifacts.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                COST_TABLE_ARTIFACT,
                FLIGHT_REPORT_ARTIFACT,
                ROUTE_PLAN_ARTIFACT,
                SEARCH_GRAPH_ARTIFACT,
                SEARCH_POLICY_ARTIFACT,
            ]
        );
        assert!(!report.bundle.get(FLIGHT_REPORT_ARTIFACT).unwrap().normative);

        let plan = plan_json(&report);
        assert_eq!(plan["outcome"], "found");
        assert_eq!(plan["route"]["actions"], serde_json::json!(["forward", "forward"]));
        assert_eq!(plan["edge_cost_total"], 4_000_000);
        assert_eq!(plan["cost_source"]["kind"], "inline");
    }

    #[test]
    fn start_equal_to_goal_is_an_empty_route() {
        let report = plan_mission(&inline_config([0, 0, 0, 0])).unwrap();
        assert!(report.route().unwrap().is_empty());
        assert_eq!(report.search.graph.metadata.total_expansions, 0);
        verify_bundle(&report.bundle).unwrap();
    }

    #[test]
    fn budget_exhaustion_still_bundles() {
        let config = MissionConfig {
            max_expansions: 2,
            ..inline_config([6, 6, 6, 0])
        };
        let report = plan_mission(&config).unwrap();
        assert_eq!(report.outcome(), RouteOutcome::BudgetExceeded);
        assert!(report.flight.is_none());
        assert!(report.bundle.get(FLIGHT_REPORT_ARTIFACT).is_none());
        verify_bundle(&report.bundle).unwrap();

        let plan = plan_json(&report);
        assert!(plan["route"].is_null());
        assert_eq!(plan["termination_reason"]["type"], "expansion_budget_exceeded");
    }

    #[test]
    fn default_budget_exhaustion_returns_a_bounded_bundle() {
        let report = plan_mission(&inline_config([300, -200, 50, 7])).unwrap();
        assert_eq!(report.outcome(), RouteOutcome::BudgetExceeded);
        assert_eq!(
            report.search.graph.metadata.total_expansions,
            SearchPolicy::DEFAULT_MAX_EXPANSIONS
        );
        assert!(report.flight.is_none());

        let graph = report.bundle.get(SEARCH_GRAPH_ARTIFACT).unwrap();
        assert!(graph.content.len() < 64 * 1024 * 1024, "{} bytes", graph.content.len());
        assert_eq!(graph.content_hash, artifact_hash(&graph.content));
        let plan = plan_json(&report);
        assert_eq!(plan["search_graph_digest"], graph.content_hash.as_str());
        assert_eq!(plan["total_expansions"], SearchPolicy::DEFAULT_MAX_EXPANSIONS);
    }

    #[test]
    fn flight_overhead_does_not_touch_normative_digest() {
        let a = plan_mission(&inline_config([1, 0, 0, 0])).unwrap();
        let mut config = inline_config([1, 0, 0, 0]);
        config.cost_entries.insert("takeoff".into(), 4.0);
        let b = plan_mission(&config).unwrap();
        assert_eq!(
            a.bundle.get(SEARCH_GRAPH_ARTIFACT).unwrap().content,
            b.bundle.get(SEARCH_GRAPH_ARTIFACT).unwrap().content
        );
        assert_ne!(
            a.bundle.get(FLIGHT_REPORT_ARTIFACT).unwrap().content,
            b.bundle.get(FLIGHT_REPORT_ARTIFACT).unwrap().content
        );
    }

    #[test]
    fn missing_cost_entry_aborts_before_search() {
        let mut config = inline_config([1, 0, 0, 0]);
        config.cost_entries.remove("flip");
        assert!(matches!(
            plan_mission(&config),
            Err(MissionError::CostTable(CostTableError::MissingEntry {
                action: Action::Flip
            }))
        ));
    }

    #[test]
    fn start_outside_bounds_is_a_search_error() {
        let config = MissionConfig {
            start: [9, 0, 0, 0],
            bounds: Some(crate::config::BoundsConfig {
                min: [-1; 4],
                max: [1; 4],
            }),
            ..inline_config([0, 0, 0, 0])
        };
        assert!(matches!(
            plan_mission(&config),
            Err(MissionError::Search(SearchError::StartOutOfBounds { .. }))
        ));
    }

    #[test]
    fn telemetry_source_records_log_hashes() {
        let dir = tempfile::tempdir().unwrap();
        write_synthetic_logs(dir.path(), 8, 5).unwrap();
        let config = MissionConfig {
            telemetry_dir: Some(dir.path().to_path_buf()),
            goal: [1, 1, 0, 0],
            ..MissionConfig::default()
        };
        let report = plan_mission(&config).unwrap();
        assert_eq!(report.outcome(), RouteOutcome::Found);
        let plan = plan_json(&report);
        assert_eq!(plan["cost_source"]["kind"], "telemetry");
        assert_eq!(plan["cost_source"]["flight_logs"].as_array().unwrap().len(), 8);
        verify_bundle(&report.bundle).unwrap();
    }

    #[test]
    fn averages_csv_matches_telemetry_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        write_synthetic_logs(&logs_dir, 8, 9).unwrap();
        let summary = ConsumptionSummary::from_logs(&load_flight_logs(&logs_dir).unwrap());
        let avg_path = dir.path().join("average_battery_data.csv");
        std::fs::write(&avg_path, render_average_csv(&summary)).unwrap();

        let from_logs = MissionConfig {
            telemetry_dir: Some(logs_dir),
            ..MissionConfig::default()
        };
        let from_avg = MissionConfig {
            averages_csv: Some(avg_path),
            ..MissionConfig::default()
        };
        let (a, _) = resolve_cost_table(&from_logs).unwrap();
        let (b, _) = resolve_cost_table(&from_avg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_averages_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avg.csv");
        std::fs::write(&path, format!("{CSV_HEADER}\nforward,abc\n")).unwrap();
        let config = MissionConfig {
            averages_csv: Some(path),
            ..MissionConfig::default()
        };
        assert!(matches!(
            resolve_cost_table(&config),
            Err(MissionError::Telemetry(TelemetryError::InFile { .. }))
        ));
    }

    #[test]
    fn identical_configs_give_identical_bundles() {
        let a = plan_mission(&inline_config([2, -1, 1, 1])).unwrap();
        let b = plan_mission(&inline_config([2, -1, 1, 1])).unwrap();
        assert_eq!(a.bundle.digest, b.bundle.digest);
        assert_eq!(a.bundle.manifest, b.bundle.manifest);
    }
}
