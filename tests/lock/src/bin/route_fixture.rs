//! Binary that plans the reference mission, writes the bundle to a temp
//! directory, reads it back, verifies it, and prints deterministic
//! `key=value` lines for cross-process comparison.
//!
//! Usage: `route_fixture`
//! Output:
//!   `bundle_digest`=sha256:...
//!   `search_graph_hash`=sha256:...
//!   `route_plan_hash`=sha256:...
//!   `outcome`=found
//!   `route`=forward,...
//!   `total_expansions`=N
//!   `energy_used`=N (cost units)
//!   `artifact_count`=5
//!   `roundtrip`=ok

use lock_tests::missions::reference_mission;
use skyroute_harness::bundle::{ROUTE_PLAN_ARTIFACT, SEARCH_GRAPH_ARTIFACT};
use skyroute_harness::bundle_dir::{read_bundle_dir, verify_bundle_dir, write_bundle_dir};
use skyroute_harness::runner::plan_mission;

fn main() {
    let report = plan_mission(&reference_mission()).expect("mission failed");
    let bundle = &report.bundle;

    let dir = std::env::temp_dir().join(format!("skyroute_route_fixture_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    write_bundle_dir(bundle, &dir).expect("write_bundle_dir failed");
    let loaded = read_bundle_dir(&dir).expect("read_bundle_dir failed");
    verify_bundle_dir(&dir).expect("verify_bundle_dir failed");
    let _ = std::fs::remove_dir_all(&dir);

    let roundtrip = if loaded.digest == bundle.digest
        && loaded.manifest == bundle.manifest
        && loaded.artifacts == bundle.artifacts
    {
        "ok"
    } else {
        "mismatch"
    };

    let route = report.route().expect("reference mission has a route");
    let flight = report.flight.as_ref().expect("found routes are flown");

    println!("bundle_digest={}", bundle.digest);
    println!(
        "search_graph_hash={}",
        bundle.artifacts[SEARCH_GRAPH_ARTIFACT].content_hash
    );
    println!(
        "route_plan_hash={}",
        bundle.artifacts[ROUTE_PLAN_ARTIFACT].content_hash
    );
    println!("outcome={}", report.outcome());
    println!("route={}", route.action_names().join(","));
    println!(
        "total_expansions={}",
        report.search.graph.metadata.total_expansions
    );
    println!("energy_used={}", flight.energy_used.units());
    println!("artifact_count={}", bundle.artifacts.len());
    println!("roundtrip={roundtrip}");
}
