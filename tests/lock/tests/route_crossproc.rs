//! Cross-process determinism for planned mission bundles.
//!
//! Spawns the `route_fixture` binary under >=4 environment variants
//! and asserts that all produce identical output, so route planning and
//! bundle round-trip do not depend on process-level state.

use std::path::Path;
use std::process::Command;

/// Resolve the path to the compiled `route_fixture` binary.
fn binary_path() -> String {
    let mut path = std::env::current_exe()
        .expect("can resolve test binary path")
        .parent()
        .expect("binary dir exists")
        .parent()
        .expect("deps parent exists")
        .to_path_buf();
    path.push("route_fixture");
    path.to_string_lossy().to_string()
}

fn workspace_root() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
        .to_string_lossy()
        .to_string()
}

fn run_variant(work_dir: &str, env_overrides: &[(&str, &str)]) -> String {
    let bin = binary_path();

    let mut command = Command::new(&bin);
    command.current_dir(work_dir);
    command
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE")
        .env_remove("RUST_LOG");

    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!("failed to spawn {bin} (work_dir={work_dir}, overrides={env_overrides:?}): {e}")
    });

    assert!(
        output.status.success(),
        "route_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

#[test]
fn crossproc_determinism_four_env_variants() {
    let root = workspace_root();
    let baseline = run_variant(&root, &[]);

    for expected in [
        "bundle_digest=sha256:",
        "search_graph_hash=sha256:",
        "outcome=found",
        "artifact_count=5",
        "roundtrip=ok",
    ] {
        assert!(
            baseline.contains(expected),
            "baseline output missing {expected}:\n{baseline}"
        );
    }

    let alt_cwd = if cfg!(target_os = "windows") {
        "C:\\"
    } else {
        "/tmp"
    };
    let variant_cwd = run_variant(alt_cwd, &[]);
    assert_eq!(
        baseline, variant_cwd,
        "output differs when cwd changes from {root} to {alt_cwd}"
    );

    let variant_locale = run_variant(&root, &[("LC_ALL", "C"), ("LANG", "C")]);
    assert_eq!(
        baseline, variant_locale,
        "output differs when LC_ALL=C LANG=C"
    );

    let variant_noise = run_variant(
        &root,
        &[
            ("SKYROUTE_NOISE", "should_not_matter"),
            ("TZ", "America/New_York"),
            ("HOME", "/nonexistent"),
            ("RUST_LOG", "debug"),
        ],
    );
    assert_eq!(
        baseline, variant_noise,
        "output differs with spurious env vars (SKYROUTE_NOISE, TZ, HOME, RUST_LOG)"
    );
}

#[test]
fn fixture_route_reaches_reference_goal() {
    let output = run_variant(&workspace_root(), &[]);
    let route = output
        .lines()
        .find_map(|l| l.strip_prefix("route="))
        .expect("route line present");
    // Goal [3, -2, 1, 2] needs at least eight moves.
    assert!(route.split(',').count() >= 8, "route too short: {route}");
    assert!(!route.split(',').any(|a| a == "flip"));
}
