//! `skyroute`: telemetry and route-planning command line.
//!
//! ```text
//! skyroute synth <dir> [count] [seed]     write synthetic flight logs
//! skyroute average <telemetry-dir>        print the averages CSV
//! skyroute plan <config.json> [out-dir]   plan a mission, optionally write its bundle
//! skyroute verify <bundle-dir>            verify a bundle directory
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) for progress output on stderr.

use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info};

use skyroute_harness::bundle_dir::{verify_bundle_dir, write_bundle_dir};
use skyroute_harness::config::MissionConfig;
use skyroute_harness::runner::plan_mission;
use skyroute_harness::synth::write_synthetic_logs;
use skyroute_harness::telemetry::{load_flight_logs, render_average_csv, ConsumptionSummary};

const USAGE: &str = "usage:
  skyroute synth <dir> [count] [seed]
  skyroute average <telemetry-dir>
  skyroute plan <config.json> [out-dir]
  skyroute verify <bundle-dir>";

const DEFAULT_SORTIES: usize = 100;
const DEFAULT_SEED: u64 = 0;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();

    let result = match argv.as_slice() {
        ["synth", dir, rest @ ..] if rest.len() <= 2 => synth(dir, rest),
        ["average", dir] => average(dir),
        ["plan", config] => plan(config, None),
        ["plan", config, out] => plan(config, Some(*out)),
        ["verify", dir] => verify(dir),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn synth(dir: &str, rest: &[&str]) -> Result<(), Box<dyn Error>> {
    let count = match rest.first() {
        Some(n) => n.parse()?,
        None => DEFAULT_SORTIES,
    };
    let seed = match rest.get(1) {
        Some(s) => s.parse()?,
        None => DEFAULT_SEED,
    };
    let written = write_synthetic_logs(Path::new(dir), count, seed)?;
    println!("wrote {} flight logs to {dir}", written.len());
    Ok(())
}

fn average(dir: &str) -> Result<(), Box<dyn Error>> {
    let logs = load_flight_logs(Path::new(dir))?;
    let summary = ConsumptionSummary::from_logs(&logs);
    info!("averaged {} flights", summary.flight_count());
    print!("{}", render_average_csv(&summary));
    Ok(())
}

fn plan(config_path: &str, out: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = MissionConfig::load(Path::new(config_path))?;
    let report = plan_mission(&config)?;

    println!("outcome={}", report.outcome());
    println!("start={}", report.start);
    println!("goal={}", report.goal);
    if let Some(route) = report.route() {
        println!("route={}", route.action_names().join(","));
        println!("steps={}", route.len());
    }
    if let Some(flight) = &report.flight {
        println!("energy_used={}", flight.energy_used);
        println!("battery_remaining={}", flight.battery_remaining);
    }
    println!(
        "expansions={}",
        report.search.graph.metadata.total_expansions
    );
    println!("bundle_digest={}", report.bundle.digest);

    if let Some(out) = out {
        write_bundle_dir(&report.bundle, Path::new(out))?;
        info!("bundle written to {out}");
    }
    Ok(())
}

fn verify(dir: &str) -> Result<(), Box<dyn Error>> {
    let bundle = verify_bundle_dir(Path::new(dir))?;
    println!("verified bundle_digest={}", bundle.digest);
    Ok(())
}
