//! Mission bundle lock tests: directory round-trip, and fail-closed
//! verification of tampered plans, graphs and files.

use lock_tests::bundle_test_helpers::{
    rebuild_with_artifact, rebuild_with_modified_graph, rebuild_with_modified_plan,
    rebuild_without_artifact,
};
use lock_tests::missions::reference_mission;
use skyroute_harness::bundle::{
    verify_bundle, ArtifactBundleV1, BundleVerifyError, COST_TABLE_ARTIFACT,
    FLIGHT_REPORT_ARTIFACT, ROUTE_PLAN_ARTIFACT, SEARCH_GRAPH_ARTIFACT,
};
use skyroute_harness::bundle_dir::{
    read_bundle_dir, verify_bundle_dir, write_bundle_dir, BundleDirReadError, BundleDirVerifyError,
};
use skyroute_harness::runner::plan_mission;
use skyroute_kernel::proof::canon::canonical_json_bytes;
use skyroute_kernel::proof::hash::canonical_json_hash;
use skyroute_kernel::proof::hash_domain::HashDomain;

fn reference_bundle() -> ArtifactBundleV1 {
    plan_mission(&reference_mission()).unwrap().bundle
}

fn plan_json(bundle: &ArtifactBundleV1) -> serde_json::Value {
    serde_json::from_slice(&bundle.artifacts[ROUTE_PLAN_ARTIFACT].content).unwrap()
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_produces_equivalent_bundle() {
    let bundle = reference_bundle();
    let dir = tempfile::tempdir().unwrap();

    write_bundle_dir(&bundle, dir.path()).unwrap();
    let loaded = read_bundle_dir(dir.path()).unwrap();

    assert_eq!(loaded.digest, bundle.digest);
    assert_eq!(loaded.manifest, bundle.manifest);
    assert_eq!(loaded.digest_basis, bundle.digest_basis);
    assert_eq!(loaded.artifacts, bundle.artifacts);
    verify_bundle(&loaded).unwrap();
}

#[test]
fn plan_binds_every_normative_artifact() {
    let bundle = reference_bundle();
    let plan = plan_json(&bundle);

    assert_eq!(plan["schema_version"], "route_plan.v1");
    assert_eq!(plan["outcome"], "found");
    assert_eq!(
        plan["cost_table_digest"],
        bundle.artifacts[COST_TABLE_ARTIFACT].content_hash.as_str()
    );
    assert_eq!(
        plan["search_graph_digest"],
        bundle.artifacts[SEARCH_GRAPH_ARTIFACT].content_hash.as_str()
    );
    let route_digest = canonical_json_hash(HashDomain::RoutePlan, &plan["route"]).unwrap();
    assert_eq!(plan["route_digest"], route_digest.as_str());
}

// ---------------------------------------------------------------------------
// Observational artifacts
// ---------------------------------------------------------------------------

#[test]
fn flight_report_is_outside_the_digest() {
    let bundle = reference_bundle();
    assert!(!bundle.artifacts[FLIGHT_REPORT_ARTIFACT].normative);

    let stripped = rebuild_without_artifact(&bundle, FLIGHT_REPORT_ARTIFACT);
    assert_eq!(stripped.digest, bundle.digest);
    verify_bundle(&stripped).unwrap();
}

// ---------------------------------------------------------------------------
// Binding failures
// ---------------------------------------------------------------------------

#[test]
fn swapped_graph_fails_binding() {
    let bundle = reference_bundle();
    let mut graph: serde_json::Value =
        serde_json::from_slice(&bundle.artifacts[SEARCH_GRAPH_ARTIFACT].content).unwrap();
    graph["metadata"]["total_expansions"] = serde_json::json!(0);
    let tampered =
        rebuild_with_artifact(&bundle, SEARCH_GRAPH_ARTIFACT, canonical_json_bytes(&graph).unwrap());

    match verify_bundle(&tampered) {
        Err(BundleVerifyError::PlanBindingMismatch { field, .. }) => {
            assert_eq!(field, "search_graph_digest");
        }
        other => panic!("expected PlanBindingMismatch, got {other:?}"),
    }
}

#[test]
fn rebound_graph_changes_bundle_digest() {
    let bundle = reference_bundle();
    let rebound = rebuild_with_modified_graph(&bundle, |graph| {
        graph["metadata"]["total_expansions"] = serde_json::json!(0);
    });
    verify_bundle(&rebound).unwrap();
    assert_ne!(rebound.digest, bundle.digest);
}

#[test]
fn missing_cost_table_binding_fails() {
    let bundle = reference_bundle();
    let tampered = rebuild_with_modified_plan(&bundle, |plan| {
        plan.as_object_mut().unwrap().remove("cost_table_digest");
    });
    match verify_bundle(&tampered) {
        Err(BundleVerifyError::PlanBindingMissing { field }) => {
            assert_eq!(field, "cost_table_digest");
        }
        other => panic!("expected PlanBindingMissing, got {other:?}"),
    }
}

#[test]
fn edited_route_fails_route_digest() {
    let bundle = reference_bundle();
    let tampered = rebuild_with_modified_plan(&bundle, |plan| {
        plan["route"]["actions"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(
        verify_bundle(&tampered),
        Err(BundleVerifyError::RouteDigestMismatch { .. })
    ));
}

#[test]
fn rehashed_short_route_fails_replay() {
    let bundle = reference_bundle();
    let tampered = rebuild_with_modified_plan(&bundle, |plan| {
        plan["route"]["actions"].as_array_mut().unwrap().pop();
        let digest = canonical_json_hash(HashDomain::RoutePlan, &plan["route"]).unwrap();
        plan["route_digest"] = serde_json::json!(digest.as_str());
    });
    assert!(matches!(
        verify_bundle(&tampered),
        Err(BundleVerifyError::RouteReplayFailed { .. })
    ));
}

// ---------------------------------------------------------------------------
// Directory fail-closed
// ---------------------------------------------------------------------------

#[test]
fn fail_closed_missing_artifact_file() {
    let bundle = reference_bundle();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();

    std::fs::remove_file(dir.path().join(ROUTE_PLAN_ARTIFACT)).unwrap();
    assert!(matches!(
        read_bundle_dir(dir.path()),
        Err(BundleDirReadError::MissingArtifact { name }) if name == ROUTE_PLAN_ARTIFACT
    ));
}

#[test]
fn fail_closed_extra_file() {
    let bundle = reference_bundle();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();

    std::fs::write(dir.path().join("notes.txt"), b"pilot notes").unwrap();
    assert!(matches!(
        read_bundle_dir(dir.path()),
        Err(BundleDirReadError::ExtraFile { name }) if name == "notes.txt"
    ));
}

#[test]
fn fail_closed_tampered_artifact_on_disk() {
    let bundle = reference_bundle();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();

    let path = dir.path().join(COST_TABLE_ARTIFACT);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.push(b' ');
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        verify_bundle_dir(dir.path()),
        Err(BundleDirVerifyError::Verify(
            BundleVerifyError::ContentHashMismatch { .. }
        ))
    ));
}
