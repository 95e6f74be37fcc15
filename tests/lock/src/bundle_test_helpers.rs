//! Helpers for mutating and rebuilding mission bundles.
//!
//! They keep every declared digest consistent with the mutated content, so a
//! negative test trips the check it targets and not an earlier hash check.

use skyroute_harness::bundle::{
    artifact_hash, build_bundle, ArtifactBundleV1, ROUTE_PLAN_ARTIFACT, SEARCH_GRAPH_ARTIFACT,
};
use skyroute_kernel::proof::canon::canonical_json_bytes;

/// Rebuild `bundle` with `name` replaced by `content`, same normative flag.
///
/// # Panics
///
/// Panics if `name` is not in the bundle.
pub fn rebuild_with_artifact(
    bundle: &ArtifactBundleV1,
    name: &str,
    content: Vec<u8>,
) -> ArtifactBundleV1 {
    assert!(bundle.artifacts.contains_key(name), "no artifact {name}");
    let inputs: Vec<(String, Vec<u8>, bool)> = bundle
        .artifacts
        .values()
        .map(|a| {
            let bytes = if a.name == name {
                content.clone()
            } else {
                a.content.clone()
            };
            (a.name.clone(), bytes, a.normative)
        })
        .collect();
    build_bundle(inputs).unwrap()
}

/// Rebuild `bundle` without `name`.
pub fn rebuild_without_artifact(bundle: &ArtifactBundleV1, name: &str) -> ArtifactBundleV1 {
    let inputs: Vec<(String, Vec<u8>, bool)> = bundle
        .artifacts
        .values()
        .filter(|a| a.name != name)
        .map(|a| (a.name.clone(), a.content.clone(), a.normative))
        .collect();
    build_bundle(inputs).unwrap()
}

/// Edit `route_plan.json` and rebuild.
///
/// # Panics
///
/// Panics if the bundle has no valid route plan.
pub fn rebuild_with_modified_plan(
    bundle: &ArtifactBundleV1,
    modify: impl FnOnce(&mut serde_json::Value),
) -> ArtifactBundleV1 {
    let mut plan: serde_json::Value =
        serde_json::from_slice(&bundle.artifacts[ROUTE_PLAN_ARTIFACT].content).unwrap();
    modify(&mut plan);
    rebuild_with_artifact(bundle, ROUTE_PLAN_ARTIFACT, canonical_json_bytes(&plan).unwrap())
}

/// Edit `search_graph.json`, update the plan's `search_graph_digest` to
/// match, and rebuild.
///
/// # Panics
///
/// Panics if the bundle lacks a graph or a route plan.
pub fn rebuild_with_modified_graph(
    bundle: &ArtifactBundleV1,
    modify: impl FnOnce(&mut serde_json::Value),
) -> ArtifactBundleV1 {
    let mut graph: serde_json::Value =
        serde_json::from_slice(&bundle.artifacts[SEARCH_GRAPH_ARTIFACT].content).unwrap();
    modify(&mut graph);
    let graph_bytes = canonical_json_bytes(&graph).unwrap();
    let graph_hash = artifact_hash(&graph_bytes);

    let with_graph = rebuild_with_artifact(bundle, SEARCH_GRAPH_ARTIFACT, graph_bytes);
    rebuild_with_modified_plan(&with_graph, |plan| {
        plan["search_graph_digest"] = serde_json::json!(graph_hash.as_str());
    })
}
