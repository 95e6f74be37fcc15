//! Telemetry pipeline lock tests: synthetic logs, averaging, and planning
//! from telemetry on disk.

use std::path::Path;

use skyroute_harness::config::MissionConfig;
use skyroute_harness::runner::plan_mission;
use skyroute_harness::synth::{log_file_name, write_synthetic_logs, FULL_BATTERY};
use skyroute_harness::telemetry::{
    flight_trajectory, load_flight_logs, parse_average_csv, render_average_csv,
    ConsumptionSummary,
};
use skyroute_kernel::carrier::action::{Action, MissionCommand};
use skyroute_kernel::cost::table::CostTable;
use skyroute_search::route::RouteOutcome;

const SORTIES: usize = 20;
const SEED: u64 = 7;

fn read_all(dir: &Path) -> Vec<Vec<u8>> {
    (1..=SORTIES)
        .map(|n| std::fs::read(dir.join(log_file_name(n))).unwrap())
        .collect()
}

#[test]
fn same_seed_same_logs() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    write_synthetic_logs(a.path(), SORTIES, SEED).unwrap();
    write_synthetic_logs(b.path(), SORTIES, SEED).unwrap();
    assert_eq!(read_all(a.path()), read_all(b.path()));

    let c = tempfile::tempdir().unwrap();
    write_synthetic_logs(c.path(), SORTIES, SEED + 1).unwrap();
    assert_ne!(read_all(a.path()), read_all(c.path()));
}

#[test]
fn synthetic_flights_drain_the_battery() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic_logs(dir.path(), SORTIES, SEED).unwrap();
    let logs = load_flight_logs(dir.path()).unwrap();
    assert_eq!(logs.len(), SORTIES);

    for log in &logs {
        let first = log.records.first().unwrap();
        let last = log.records.last().unwrap();
        assert_eq!(first.command, MissionCommand::Takeoff);
        assert_eq!(last.command, MissionCommand::Land);

        let before_land = log.total_consumption() - last.consumption;
        assert!(before_land >= FULL_BATTERY - 1e-9, "flight ended with charge left");
        assert!(log
            .records
            .iter()
            .all(|r| r.command != MissionCommand::Route(Action::Up)));
        flight_trajectory(log).unwrap();
    }
}

#[test]
fn averages_cover_every_routing_command() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic_logs(dir.path(), SORTIES, SEED).unwrap();
    let summary = ConsumptionSummary::from_logs(&load_flight_logs(dir.path()).unwrap());
    assert_eq!(summary.flight_count(), SORTIES);

    for action in Action::ALL.into_iter().filter(|a| *a != Action::Up) {
        let mean = summary.mean(MissionCommand::Route(action)).unwrap();
        assert!((0.8..=2.5).contains(&mean), "{action} mean {mean}");
    }
    assert!(summary.mean(MissionCommand::Route(Action::Up)).is_none());

    let takeoff = summary.mean(MissionCommand::Takeoff).unwrap();
    assert!((4.0..=5.0).contains(&takeoff));
    let land = summary.mean(MissionCommand::Land).unwrap();
    assert!((2.0..=3.0).contains(&land));
}

#[test]
fn averages_csv_round_trips_pooled_means() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic_logs(dir.path(), SORTIES, SEED).unwrap();
    let summary = ConsumptionSummary::from_logs(&load_flight_logs(dir.path()).unwrap());

    let csv = render_average_csv(&summary);
    let parsed = parse_average_csv(&csv).unwrap();
    assert_eq!(parsed, summary.means());
    // takeoff, land and eight routing commands; up is never flown.
    assert_eq!(parsed.len(), 10);
    assert_eq!(
        CostTable::from_entries(parsed.iter().map(|(c, v)| (c.name(), *v))).unwrap(),
        summary.to_cost_table().unwrap()
    );
}

#[test]
fn plan_from_config_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_synthetic_logs(&dir.path().join("battery_consumption"), SORTIES, SEED).unwrap();

    let config_path = dir.path().join("mission.json");
    std::fs::write(
        &config_path,
        r#"{
            "goal": [2, 1, 1, -1],
            "telemetry_dir": "battery_consumption",
            "bounds": { "min": [-4, -4, 0, -4], "max": [4, 4, 4, 4] }
        }"#,
    )
    .unwrap();

    let config = MissionConfig::load(&config_path).unwrap();
    let first = plan_mission(&config).unwrap();
    let second = plan_mission(&config).unwrap();

    assert_eq!(first.outcome(), RouteOutcome::Found);
    assert_eq!(first.bundle.digest, second.bundle.digest);
    let flight = first.flight.unwrap();
    assert_eq!(flight.final_pose, config.goal_pose());
}
