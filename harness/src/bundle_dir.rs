//! Bundle directory persistence: write, read and verify an
//! [`ArtifactBundleV1`] on disk.
//!
//! # Layout
//!
//! ```text
//! <dir>/
//!   bundle_manifest.json       canonical JSON, every artifact
//!   bundle_digest_basis.json   canonical JSON, normative artifacts only
//!   bundle_digest.txt          "sha256:..."
//!   cost_table.json            normative
//!   search_policy.json         normative
//!   search_graph.json          normative
//!   route_plan.json            normative
//!   flight_report.json         observational
//! ```
//!
//! The directory path is never hashed. The manifest, not the directory
//! listing, says which artifacts exist.
//!
//! Reading fails closed: a missing declared artifact, an undeclared extra
//! file, or a stored digest that does not match the digest basis is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use skyroute_kernel::proof::hash::{canonical_hash, ContentHash};

use crate::bundle::{
    verify_bundle, ArtifactBundleV1, BundleArtifact, BundleVerifyError, DOMAIN_BUNDLE_DIGEST,
};

const MANIFEST_FILENAME: &str = "bundle_manifest.json";
const DIGEST_BASIS_FILENAME: &str = "bundle_digest_basis.json";
const DIGEST_FILENAME: &str = "bundle_digest.txt";

const METADATA_FILENAMES: [&str; 3] = [MANIFEST_FILENAME, DIGEST_BASIS_FILENAME, DIGEST_FILENAME];

/// Prefix of in-flight temp files; ignored when listing.
const TEMP_PREFIX: &str = ".tmp_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleDirWriteError {
    Io { detail: String },
}

impl fmt::Display for BundleDirWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
        }
    }
}

impl std::error::Error for BundleDirWriteError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleDirReadError {
    Io { detail: String },
    MissingMetadata { filename: String },
    MissingArtifact { name: String },
    ExtraFile { name: String },
    ManifestParseError { detail: String },
    ManifestVersionMismatch { found: String },
    ManifestEntryInvalid { detail: String },
    DigestMismatch { stored: String, recomputed: String },
}

impl fmt::Display for BundleDirReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingMetadata { filename } => write!(f, "missing metadata file: {filename}"),
            Self::MissingArtifact { name } => write!(f, "missing artifact: {name}"),
            Self::ExtraFile { name } => write!(f, "undeclared extra file: {name}"),
            Self::ManifestParseError { detail } => write!(f, "manifest parse error: {detail}"),
            Self::ManifestVersionMismatch { found } => {
                write!(f, "manifest version mismatch: {found}")
            }
            Self::ManifestEntryInvalid { detail } => write!(f, "manifest entry invalid: {detail}"),
            Self::DigestMismatch { stored, recomputed } => {
                write!(f, "digest mismatch: stored={stored}, recomputed={recomputed}")
            }
        }
    }
}

impl std::error::Error for BundleDirReadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleDirVerifyError {
    Read(BundleDirReadError),
    Verify(BundleVerifyError),
}

impl fmt::Display for BundleDirVerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read error: {e}"),
            Self::Verify(e) => write!(f, "verify error: {e}"),
        }
    }
}

impl std::error::Error for BundleDirVerifyError {}

impl From<BundleDirReadError> for BundleDirVerifyError {
    fn from(e: BundleDirReadError) -> Self {
        Self::Read(e)
    }
}

impl From<BundleVerifyError> for BundleDirVerifyError {
    fn from(e: BundleVerifyError) -> Self {
        Self::Verify(e)
    }
}

/// Write every artifact plus the three metadata files into `dir`.
///
/// Creates `dir` if needed. Each file is written through a temp file and a
/// rename.
///
/// # Errors
///
/// Returns [`BundleDirWriteError`] on I/O failure.
pub fn write_bundle_dir(bundle: &ArtifactBundleV1, dir: &Path) -> Result<(), BundleDirWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| BundleDirWriteError::Io {
        detail: format!("create_dir_all {}: {e}", dir.display()),
    })?;

    for artifact in bundle.artifacts.values() {
        write_atomic(dir, &artifact.name, &artifact.content)?;
    }
    write_atomic(dir, MANIFEST_FILENAME, &bundle.manifest)?;
    write_atomic(dir, DIGEST_BASIS_FILENAME, &bundle.digest_basis)?;
    write_atomic(dir, DIGEST_FILENAME, bundle.digest.as_str().as_bytes())?;

    log::debug!(
        "wrote bundle {} ({} artifacts) to {}",
        bundle.digest,
        bundle.artifacts.len(),
        dir.display()
    );
    Ok(())
}

/// Read a bundle directory back into memory.
///
/// Only the manifest schema, the file set and the stored digest are checked
/// here. Use [`verify_bundle_dir`] for full verification.
///
/// # Errors
///
/// Returns [`BundleDirReadError`] on any validation failure.
pub fn read_bundle_dir(dir: &Path) -> Result<ArtifactBundleV1, BundleDirReadError> {
    let manifest = read_required(dir, MANIFEST_FILENAME)?;
    let digest_basis = read_required(dir, DIGEST_BASIS_FILENAME)?;
    let stored_digest = read_required(dir, DIGEST_FILENAME)?;

    let mut artifacts = BTreeMap::new();
    for entry in parse_manifest(&manifest)? {
        let content = std::fs::read(dir.join(&entry.name)).map_err(|_| {
            BundleDirReadError::MissingArtifact {
                name: entry.name.clone(),
            }
        })?;
        artifacts.insert(
            entry.name.clone(),
            BundleArtifact {
                name: entry.name,
                content,
                content_hash: entry.content_hash,
                normative: entry.normative,
            },
        );
    }

    for filename in list_files(dir)? {
        if !artifacts.contains_key(&filename) && !METADATA_FILENAMES.contains(&filename.as_str()) {
            return Err(BundleDirReadError::ExtraFile { name: filename });
        }
    }

    let digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &digest_basis);
    let stored = String::from_utf8_lossy(&stored_digest).trim().to_string();
    if digest.as_str() != stored {
        return Err(BundleDirReadError::DigestMismatch {
            stored,
            recomputed: digest.as_str().to_string(),
        });
    }

    Ok(ArtifactBundleV1 {
        artifacts,
        manifest,
        digest_basis,
        digest,
    })
}

/// Read `dir`, then run [`verify_bundle`] on the result.
///
/// # Errors
///
/// Returns [`BundleDirVerifyError`] on read failure or integrity mismatch.
pub fn verify_bundle_dir(dir: &Path) -> Result<ArtifactBundleV1, BundleDirVerifyError> {
    let bundle = read_bundle_dir(dir)?;
    verify_bundle(&bundle)?;
    Ok(bundle)
}

struct ManifestEntry {
    name: String,
    content_hash: ContentHash,
    normative: bool,
}

fn parse_manifest(bytes: &[u8]) -> Result<Vec<ManifestEntry>, BundleDirReadError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| BundleDirReadError::ManifestParseError {
            detail: e.to_string(),
        })?;

    let schema_version = value["schema_version"].as_str().unwrap_or("");
    if schema_version != "bundle.v1" {
        return Err(BundleDirReadError::ManifestVersionMismatch {
            found: schema_version.to_string(),
        });
    }

    let invalid = |detail: String| BundleDirReadError::ManifestEntryInvalid { detail };
    let entries = value["artifacts"]
        .as_array()
        .ok_or_else(|| BundleDirReadError::ManifestParseError {
            detail: "\"artifacts\" is not an array".into(),
        })?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry["name"]
            .as_str()
            .ok_or_else(|| invalid("missing \"name\"".into()))?;
        if !is_plain_filename(name) {
            return Err(invalid(format!("artifact name {name:?} is not a plain file name")));
        }
        let hash = entry["content_hash"]
            .as_str()
            .ok_or_else(|| invalid(format!("missing \"content_hash\" for {name}")))?;
        let content_hash = ContentHash::parse(hash)
            .ok_or_else(|| invalid(format!("invalid content_hash for {name}: {hash}")))?;
        let normative = entry["normative"]
            .as_bool()
            .ok_or_else(|| invalid(format!("missing \"normative\" for {name}")))?;
        out.push(ManifestEntry {
            name: name.to_string(),
            content_hash,
            normative,
        });
    }
    Ok(out)
}

/// No separators, no parent references, not a metadata or temp name.
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with(TEMP_PREFIX)
        && !METADATA_FILENAMES.contains(&name)
}

fn write_atomic(dir: &Path, name: &str, content: &[u8]) -> Result<(), BundleDirWriteError> {
    let path = dir.join(name);
    let temp_path = dir.join(format!("{TEMP_PREFIX}{name}"));

    std::fs::write(&temp_path, content).map_err(|e| BundleDirWriteError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;
    std::fs::rename(&temp_path, &path).map_err(|e| BundleDirWriteError::Io {
        detail: format!("rename {} to {}: {e}", temp_path.display(), path.display()),
    })
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, BundleDirReadError> {
    std::fs::read(dir.join(filename)).map_err(|_| BundleDirReadError::MissingMetadata {
        filename: filename.to_string(),
    })
}

/// Regular files in `dir`, temp files excluded.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, BundleDirReadError> {
    let io_err = |e: std::io::Error| BundleDirReadError::Io {
        detail: format!("read_dir {}: {e}", dir.display()),
    };

    let mut files = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with(TEMP_PREFIX) {
                files.insert(name.to_string());
            }
        }
    }
    Ok(files)
}
