//! In-memory artifact bundle: the output of a mission run.
//!
//! No file I/O in this module (see [`crate::bundle_dir`]).
//!
//! # Normative vs observational artifacts
//!
//! Each artifact is tagged `normative` (participates in the bundle digest)
//! or observational (listed in the manifest, excluded from the digest).
//! `flight_report.json` is observational: it depends on mission overhead
//! entries that never influence planning.
//!
//! The bundle digest is computed over the **digest basis**: a canonical
//! JSON projection of normative artifact hashes only.
//!
//! # Route plan bindings
//!
//! `route_plan.json` declares the content hashes of the artifacts it was
//! planned from. Verification checks each declared hash against the
//! artifact actually in the bundle, and replays the planned route.

use std::collections::BTreeMap;
use std::fmt;

use skyroute_kernel::carrier::action::Action;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::proof::canon::canonical_json_bytes;
use skyroute_kernel::proof::hash::{canonical_hash, canonical_json_hash, ContentHash};
use skyroute_kernel::proof::hash_domain::HashDomain;
use skyroute_kernel::proof::replay::{verify_route, ReplayVerdict};

pub const DOMAIN_BUNDLE_ARTIFACT: HashDomain = HashDomain::BundleArtifact;
pub const DOMAIN_BUNDLE_DIGEST: HashDomain = HashDomain::BundleDigest;

pub const COST_TABLE_ARTIFACT: &str = "cost_table.json";
pub const SEARCH_POLICY_ARTIFACT: &str = "search_policy.json";
pub const SEARCH_GRAPH_ARTIFACT: &str = "search_graph.json";
pub const ROUTE_PLAN_ARTIFACT: &str = "route_plan.json";
pub const FLIGHT_REPORT_ARTIFACT: &str = "flight_report.json";

/// `(route_plan field, artifact it must hash)`.
const PLAN_BINDINGS: &[(&str, &str)] = &[
    ("cost_table_digest", COST_TABLE_ARTIFACT),
    ("policy_digest", SEARCH_POLICY_ARTIFACT),
    ("search_graph_digest", SEARCH_GRAPH_ARTIFACT),
];

/// A single artifact in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    /// Logical filename (e.g., `"route_plan.json"`).
    pub name: String,
    pub content: Vec<u8>,
    /// `canonical_hash(DOMAIN_BUNDLE_ARTIFACT, content)`.
    pub content_hash: ContentHash,
    /// Whether this artifact participates in the bundle digest.
    pub normative: bool,
}

/// The complete artifact bundle from a mission run.
///
/// All JSON artifacts use kernel's `canonical_json_bytes`.
#[derive(Debug, Clone)]
pub struct ArtifactBundleV1 {
    /// Artifacts indexed by logical name, in sorted order.
    pub artifacts: BTreeMap<String, BundleArtifact>,
    /// Full manifest: canonical JSON listing all artifacts with normative flags.
    pub manifest: Vec<u8>,
    /// Digest basis: canonical JSON listing normative artifact hashes only.
    pub digest_basis: Vec<u8>,
    /// `canonical_hash(DOMAIN_BUNDLE_DIGEST, digest_basis)`.
    pub digest: ContentHash,
}

impl ArtifactBundleV1 {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BundleArtifact> {
        self.artifacts.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleBuildError {
    CanonError { detail: String },
    /// Caller-provided `precomputed_hash` does not match the recomputed hash.
    PrecomputedHashMismatch {
        name: String,
        expected: String,
        computed: String,
    },
}

impl fmt::Display for BundleBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::PrecomputedHashMismatch {
                name,
                expected,
                computed,
            } => write!(
                f,
                "precomputed hash for {name} is {expected}, content hashes to {computed}"
            ),
        }
    }
}

impl std::error::Error for BundleBuildError {}

/// Input for bundle assembly.
///
/// If `precomputed_hash` is provided it must equal
/// `canonical_hash(DOMAIN_BUNDLE_ARTIFACT, &content)`.
pub struct ArtifactInput {
    pub name: String,
    pub content: Vec<u8>,
    pub normative: bool,
    pub precomputed_hash: Option<ContentHash>,
}

impl From<(String, Vec<u8>, bool)> for ArtifactInput {
    fn from((name, content, normative): (String, Vec<u8>, bool)) -> Self {
        Self {
            name,
            content,
            normative,
            precomputed_hash: None,
        }
    }
}

/// Content hash an artifact will carry once bundled.
#[must_use]
pub fn artifact_hash(content: &[u8]) -> ContentHash {
    canonical_hash(DOMAIN_BUNDLE_ARTIFACT, content)
}

/// Build an `ArtifactBundleV1` from a list of artifact inputs.
///
/// Accepts `Vec<ArtifactInput>` or `Vec<(String, Vec<u8>, bool)>`.
///
/// # Errors
///
/// Returns [`BundleBuildError`] if canonical JSON serialization fails or a
/// precomputed hash is wrong.
pub fn build_bundle(
    artifacts: Vec<impl Into<ArtifactInput>>,
) -> Result<ArtifactBundleV1, BundleBuildError> {
    let mut artifact_map = BTreeMap::new();

    for input in artifacts {
        let input = input.into();
        let computed = artifact_hash(&input.content);
        if let Some(expected) = input.precomputed_hash {
            if expected != computed {
                return Err(BundleBuildError::PrecomputedHashMismatch {
                    name: input.name,
                    expected: expected.as_str().to_string(),
                    computed: computed.as_str().to_string(),
                });
            }
        }
        artifact_map.insert(
            input.name.clone(),
            BundleArtifact {
                name: input.name,
                content: input.content,
                content_hash: computed,
                normative: input.normative,
            },
        );
    }

    let manifest = compute_manifest_bytes(&artifact_map)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest_basis = compute_digest_basis_bytes(&artifact_map)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &digest_basis);

    Ok(ArtifactBundleV1 {
        artifacts: artifact_map,
        manifest,
        digest_basis,
        digest,
    })
}

/// Error from bundle integrity verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleVerifyError {
    ContentHashMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
    ManifestMismatch,
    ManifestNotCanonical,
    DigestBasisMismatch,
    DigestBasisNotCanonical,
    DigestMismatch { expected: String, actual: String },
    /// A normative `.json` artifact is not in canonical form.
    ArtifactNotCanonical { artifact: String },
    CanonError { detail: String },
    PlanParseError { detail: String },
    /// The route plan lacks a binding field for an artifact that is present.
    PlanBindingMissing { field: String },
    PlanBindingMismatch {
        field: String,
        declared: String,
        recomputed: String,
    },
    /// The route plan's `route_digest` does not hash its `route`.
    RouteDigestMismatch { declared: String, recomputed: String },
    /// The planned route is malformed or does not replay to its goal.
    RouteReplayFailed { detail: String },
}

impl fmt::Display for BundleVerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentHashMismatch {
                artifact,
                expected,
                actual,
            } => write!(f, "{artifact}: content hash {actual}, manifest says {expected}"),
            Self::ManifestMismatch => write!(f, "manifest does not match artifacts"),
            Self::ManifestNotCanonical => write!(f, "manifest is not canonical JSON"),
            Self::DigestBasisMismatch => write!(f, "digest basis does not match artifacts"),
            Self::DigestBasisNotCanonical => write!(f, "digest basis is not canonical JSON"),
            Self::DigestMismatch { expected, actual } => {
                write!(f, "bundle digest {actual}, expected {expected}")
            }
            Self::ArtifactNotCanonical { artifact } => {
                write!(f, "{artifact} is not canonical JSON")
            }
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::PlanParseError { detail } => write!(f, "route plan parse error: {detail}"),
            Self::PlanBindingMissing { field } => write!(f, "route plan lacks {field}"),
            Self::PlanBindingMismatch {
                field,
                declared,
                recomputed,
            } => write!(f, "route plan {field} is {declared}, artifact hashes to {recomputed}"),
            Self::RouteDigestMismatch {
                declared,
                recomputed,
            } => write!(f, "route digest is {declared}, route hashes to {recomputed}"),
            Self::RouteReplayFailed { detail } => write!(f, "route replay failed: {detail}"),
        }
    }
}

impl std::error::Error for BundleVerifyError {}

/// Verify the internal consistency of a bundle.
///
/// 1. Each artifact's `content_hash` matches its content.
/// 2. `manifest` matches the projection recomputed from all artifacts.
/// 3. `manifest` is canonical JSON.
/// 4. `digest_basis` matches the projection recomputed from normative artifacts.
/// 5. `digest_basis` is canonical JSON.
/// 6. `digest` matches `canonical_hash(DOMAIN_BUNDLE_DIGEST, digest_basis)`.
/// 7. Normative `.json` artifacts are canonical.
/// 8. If `route_plan.json` is present: every bound artifact that is present
///    has its hash declared in the plan, and the declared hash matches.
/// 9. If `route_plan.json` carries a route: `route_digest` hashes it and the
///    actions replay from `start` to `goal`.
///
/// # Errors
///
/// Returns the first [`BundleVerifyError`] encountered.
pub fn verify_bundle(bundle: &ArtifactBundleV1) -> Result<(), BundleVerifyError> {
    for artifact in bundle.artifacts.values() {
        let recomputed = artifact_hash(&artifact.content);
        if recomputed != artifact.content_hash {
            return Err(BundleVerifyError::ContentHashMismatch {
                artifact: artifact.name.clone(),
                expected: artifact.content_hash.as_str().to_string(),
                actual: recomputed.as_str().to_string(),
            });
        }
    }

    let expected_manifest = compute_manifest_bytes(&bundle.artifacts)
        .map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if expected_manifest != bundle.manifest {
        return Err(BundleVerifyError::ManifestMismatch);
    }
    verify_canonical_json(&bundle.manifest)
        .map_err(|()| BundleVerifyError::ManifestNotCanonical)?;

    let expected_basis = compute_digest_basis_bytes(&bundle.artifacts)
        .map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if expected_basis != bundle.digest_basis {
        return Err(BundleVerifyError::DigestBasisMismatch);
    }
    verify_canonical_json(&bundle.digest_basis)
        .map_err(|()| BundleVerifyError::DigestBasisNotCanonical)?;

    let recomputed_digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &bundle.digest_basis);
    if recomputed_digest != bundle.digest {
        return Err(BundleVerifyError::DigestMismatch {
            expected: bundle.digest.as_str().to_string(),
            actual: recomputed_digest.as_str().to_string(),
        });
    }

    for artifact in bundle.artifacts.values() {
        let is_json = std::path::Path::new(&artifact.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if artifact.normative && is_json {
            verify_canonical_json(&artifact.content).map_err(|()| {
                BundleVerifyError::ArtifactNotCanonical {
                    artifact: artifact.name.clone(),
                }
            })?;
        }
    }

    let Some(plan_artifact) = bundle.get(ROUTE_PLAN_ARTIFACT) else {
        return Ok(());
    };
    let plan: serde_json::Value = serde_json::from_slice(&plan_artifact.content).map_err(|e| {
        BundleVerifyError::PlanParseError {
            detail: e.to_string(),
        }
    })?;
    verify_plan_bindings(bundle, &plan)?;
    verify_planned_route(&plan)
}

/// Recompute manifest bytes from the artifact map.
fn compute_manifest_bytes(artifacts: &BTreeMap<String, BundleArtifact>) -> Result<Vec<u8>, String> {
    let manifest_artifacts: Vec<serde_json::Value> = artifacts
        .values()
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
                "normative": a.normative,
            })
        })
        .collect();

    canonical_json_bytes(&serde_json::json!({
        "artifacts": manifest_artifacts,
        "schema_version": "bundle.v1",
    }))
    .map_err(|e| e.to_string())
}

/// Recompute digest basis bytes from normative artifacts only.
fn compute_digest_basis_bytes(
    artifacts: &BTreeMap<String, BundleArtifact>,
) -> Result<Vec<u8>, String> {
    let normative_artifacts: Vec<serde_json::Value> = artifacts
        .values()
        .filter(|a| a.normative)
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
            })
        })
        .collect();

    canonical_json_bytes(&serde_json::json!({
        "artifacts": normative_artifacts,
        "schema_version": "bundle_digest_basis.v1",
    }))
    .map_err(|e| e.to_string())
}

/// Parse, re-canonicalize, compare.
fn verify_canonical_json(bytes: &[u8]) -> Result<(), ()> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|_| ())?;
    let recanonized = canonical_json_bytes(&value).map_err(|_| ())?;
    if recanonized == bytes {
        Ok(())
    } else {
        Err(())
    }
}

/// Each bound artifact that is present must be declared, and match.
fn verify_plan_bindings(
    bundle: &ArtifactBundleV1,
    plan: &serde_json::Value,
) -> Result<(), BundleVerifyError> {
    for &(field, artifact_name) in PLAN_BINDINGS {
        let Some(artifact) = bundle.get(artifact_name) else {
            continue;
        };
        let declared = plan
            .get(field)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| BundleVerifyError::PlanBindingMissing {
                field: field.to_string(),
            })?;
        if declared != artifact.content_hash.as_str() {
            return Err(BundleVerifyError::PlanBindingMismatch {
                field: field.to_string(),
                declared: declared.to_string(),
                recomputed: artifact.content_hash.as_str().to_string(),
            });
        }
    }
    Ok(())
}

/// `route_digest` covers `route`, and `route` replays to its goal.
fn verify_planned_route(plan: &serde_json::Value) -> Result<(), BundleVerifyError> {
    let route = &plan["route"];
    if route.is_null() {
        return Ok(());
    }

    let recomputed = canonical_json_hash(HashDomain::RoutePlan, route)
        .map_err(|e| BundleVerifyError::CanonError {
            detail: e.to_string(),
        })?;
    let declared = plan["route_digest"].as_str().ok_or_else(|| {
        BundleVerifyError::PlanBindingMissing {
            field: "route_digest".into(),
        }
    })?;
    if declared != recomputed.as_str() {
        return Err(BundleVerifyError::RouteDigestMismatch {
            declared: declared.to_string(),
            recomputed: recomputed.as_str().to_string(),
        });
    }

    let replay_err = |detail: String| BundleVerifyError::RouteReplayFailed { detail };
    let start = pose_from_json(&route["start"]).ok_or_else(|| replay_err("bad start".into()))?;
    let goal = pose_from_json(&route["goal"]).ok_or_else(|| replay_err("bad goal".into()))?;
    let actions = route["actions"]
        .as_array()
        .ok_or_else(|| replay_err("actions is not an array".into()))?
        .iter()
        .map(|v| v.as_str().and_then(Action::from_name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| replay_err("unknown action".into()))?;

    match verify_route(start, goal, &actions) {
        Ok(ReplayVerdict::Match) => Ok(()),
        Ok(ReplayVerdict::Divergence { expected, actual }) => Err(replay_err(format!(
            "route ends at {actual}, goal is {expected}"
        ))),
        Err(e) => Err(replay_err(e.to_string())),
    }
}

fn pose_from_json(value: &serde_json::Value) -> Option<Pose> {
    let components = value.as_array()?;
    let mut out = [0i64; 4];
    if components.len() != out.len() {
        return None;
    }
    for (slot, v) in out.iter_mut().zip(components) {
        *slot = v.as_i64()?;
    }
    Some(Pose::from(out))
}
