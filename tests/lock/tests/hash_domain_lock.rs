//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. The domain set has the expected size
//! 2. Domain byte strings are unique
//! 3. Domains are null-terminated and follow `SKYROUTE::*::V1\0`
//! 4. No raw `SKYROUTE::` literals in production source outside `hash_domain.rs`
//! 5. No `deny_unknown_fields` in production source
//! 6. `canonical_hash` is plain SHA-256 over `domain || data`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use skyroute_kernel::proof::hash::canonical_hash;
use skyroute_kernel::proof::hash_domain::HashDomain;

#[test]
fn hash_domain_canonical_set_count() {
    assert_eq!(
        HashDomain::ALL.len(),
        7,
        "expected 7 domain variants; if you added a new domain, update this count"
    );
}

#[test]
fn hash_domain_all_unique_bytes() {
    let mut seen = BTreeSet::new();
    for domain in HashDomain::ALL {
        assert!(
            seen.insert(domain.as_bytes()),
            "duplicate domain bytes: {domain}"
        );
    }
}

#[test]
fn hash_domain_all_follow_naming_convention() {
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(bytes.starts_with(b"SKYROUTE::"), "{domain} lacks SKYROUTE:: prefix");
        assert!(bytes.ends_with(b"::V1\0"), "{domain} does not end with ::V1\\0");
        assert_eq!(
            bytes.iter().filter(|&&b| b == 0).count(),
            1,
            "{domain} has an interior null"
        );
    }
}

#[test]
fn canonical_hash_matches_independent_sha256() {
    for domain in HashDomain::ALL {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        hasher.update(b"route");
        let expected = format!("sha256:{}", hex::encode(hasher.finalize()));
        assert_eq!(canonical_hash(*domain, b"route").as_str(), expected);
    }
}

#[test]
fn no_raw_domain_literals_outside_authority() {
    let violations = scan_production_source("b\"SKYROUTE::", Some("hash_domain.rs"));
    assert!(
        violations.is_empty(),
        "raw SKYROUTE:: domain literals found outside hash_domain.rs:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_deny_unknown_fields_in_production() {
    let violations = scan_production_source("deny_unknown_fields", None);
    assert!(
        violations.is_empty(),
        "deny_unknown_fields breaks config and artifact extensibility:\n{}",
        violations.join("\n")
    );
}

/// Non-test, non-comment lines in kernel/search/harness `src/` containing
/// `pattern`, skipping files named `authority`.
fn scan_production_source(pattern: &str, authority: Option<&str>) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let mut violations = Vec::new();
    for crate_dir in ["kernel", "search", "harness"] {
        for path in walk(&root.join(crate_dir).join("src")) {
            if path.extension().and_then(|e| e.to_str()) != Some("rs") {
                continue;
            }
            if authority.is_some() && path.file_name().and_then(|n| n.to_str()) == authority {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for (i, line) in production_lines(&content) {
                if line.contains(pattern) {
                    violations.push(format!("  {}:{}: {}", path.display(), i + 1, line));
                }
            }
        }
    }
    violations
}

/// Lines outside `#[cfg(test)]` blocks and `//` comments, with indices.
fn production_lines(content: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut depth: usize = 0;
    let mut skip_above: Option<usize> = None;
    let mut cfg_test_pending = false;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            cfg_test_pending = true;
            continue;
        }
        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        if cfg_test_pending && opens > 0 {
            skip_above = Some(depth);
            cfg_test_pending = false;
        }
        depth = depth.saturating_add(opens).saturating_sub(closes);

        if let Some(d) = skip_above {
            if depth <= d {
                skip_above = None;
            }
            continue;
        }
        if !trimmed.starts_with("//") {
            out.push((i, trimmed));
        }
    }
    out
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(walk(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}
