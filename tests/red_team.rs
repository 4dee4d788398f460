//! Red team tests for the allow-list gate.
//!
//! These tests feed hostile lockfiles and trust policies through the public
//! API and assert that the set of packages whose scripts run never grows
//! beyond what the trust policy names, and that hostile inputs are refused
//! instead of half-processed.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use lockwarden::checks::{check_integrity, check_trust_policy};
use lockwarden::lockfile::Lockfile;
use lockwarden::package_manager::ToolOutput;
use lockwarden::runner::run_trusted_scripts;
use lockwarden::trust::{select_trusted, TrustEntry, TrustPolicy};
use lockwarden::{Context, GuardError, PackageManager, Settings, Status};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Records rebuild requests; every other command is unreachable here.
#[derive(Default)]
struct RecordingPm {
    rebuilt: RefCell<Vec<String>>,
}

impl PackageManager for RecordingPm {
    fn audit_json(&self) -> lockwarden::Result<ToolOutput> {
        Ok(ToolOutput::default())
    }
    fn audit_at_level(&self, _level: &str) -> lockwarden::Result<ToolOutput> {
        Ok(ToolOutput::default())
    }
    fn audit_signatures(&self) -> lockwarden::Result<ToolOutput> {
        Ok(ToolOutput::default())
    }
    fn version(&self) -> lockwarden::Result<String> {
        Ok("10.0.0".into())
    }
    fn rebuild(&self, package: &str, _timeout: Duration) -> lockwarden::Result<()> {
        self.rebuilt.borrow_mut().push(package.to_string());
        Ok(())
    }
}

fn policy(names: &[&str]) -> TrustPolicy {
    TrustPolicy {
        last_reviewed: Some("2024-01-01".into()),
        review_cadence: None,
        packages: names
            .iter()
            .map(|n| TrustEntry {
                name: Some((*n).to_string()),
                reason: Some("reviewed".into()),
                ..TrustEntry::default()
            })
            .collect(),
    }
}

fn lock(json: &str) -> Lockfile {
    Lockfile::parse(json.as_bytes(), Path::new("package-lock.json")).unwrap()
}

fn selected(policy: &TrustPolicy, lock: &Lockfile) -> Vec<String> {
    select_trusted(policy, lock.installed_names())
        .iter()
        .map(|m| m.package.to_string())
        .collect()
}

// -------------------------------------------------------------------------
// (a) Name confusion: look-alike packages must not ride on a trusted name
// -------------------------------------------------------------------------

#[test]
fn lookalike_names_are_not_trusted() {
    let l = lock(
        r#"{"packages": {
            "": {},
            "node_modules/esbuild-evil": {},
            "node_modules/esbuildx": {},
            "node_modules/@evil/esbuild": {},
            "node_modules/evil/node_modules/esbuild": {}
        }}"#,
    );
    assert!(selected(&policy(&["esbuild"]), &l).is_empty());
}

// -------------------------------------------------------------------------
// (b) Path tricks in lockfile keys
// -------------------------------------------------------------------------

#[test]
fn traversal_keys_are_not_trusted() {
    let l = lock(
        r#"{"packages": {
            "node_modules/esbuild/../evil": {},
            "node_modules/esbuild/./evil": {},
            "node_modules/esbuild//evil": {}
        }}"#,
    );
    assert!(selected(&policy(&["esbuild"]), &l).is_empty());
}

#[test]
fn flag_like_names_never_reach_the_package_manager() {
    let l = lock(r#"{"packages": {"node_modules/--global": {}, "--global": {}}}"#);
    assert!(selected(&policy(&["--global"]), &l).is_empty());
}

// -------------------------------------------------------------------------
// (c) Degenerate trust entries
// -------------------------------------------------------------------------

#[test]
fn empty_or_missing_names_trust_nothing() {
    let l = lock(r#"{"packages": {"node_modules/a": {}, "node_modules/b/c": {}}}"#);
    let mut p = policy(&["", "   "]);
    p.packages.push(TrustEntry::default());
    assert!(selected(&p, &l).is_empty());
}

#[test]
fn trailing_slash_entry_does_not_widen_match() {
    let l = lock(r#"{"packages": {"node_modules/esbuild": {}, "node_modules/esbuild/x": {}}}"#);
    assert!(selected(&policy(&["esbuild/"]), &l).is_empty());
}

// -------------------------------------------------------------------------
// (d) Hostile files on disk
// -------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn symlinked_trust_policy_is_refused() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let real = outside.path().join("policy.json");
    fs::write(&real, r#"{"packages": [{"name": "evil", "reason": "x"}]}"#).unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("trusted-packages.json")).unwrap();
    fs::write(
        dir.path().join("package-lock.json"),
        r#"{"packages": {"node_modules/evil": {}}}"#,
    )
    .unwrap();

    let ctx = Context::new(dir.path(), Settings::default());
    let pm = RecordingPm::default();
    let err = run_trusted_scripts(&ctx, &pm, false).unwrap_err();
    assert!(matches!(err, GuardError::Symlink(_)), "got {err}");
    assert!(pm.rebuilt.borrow().is_empty());

    let report = check_trust_policy(&ctx);
    assert_eq!(report.status, Status::Fail);
}

#[test]
fn malformed_lockfile_stops_runner() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trusted-packages.json"),
        r#"{"packages": [{"name": "esbuild", "reason": "x"}]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("package-lock.json"), "{\"packages\": [1, 2]}").unwrap();

    let ctx = Context::new(dir.path(), Settings::default());
    let pm = RecordingPm::default();
    assert!(run_trusted_scripts(&ctx, &pm, false).is_err());
    assert!(pm.rebuilt.borrow().is_empty());
    assert_eq!(check_integrity(&ctx).status, Status::Fail);
}

#[test]
fn badly_shaped_trust_entries_trust_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trusted-packages.json"),
        r#"{"packages": ["esbuild", {"name": "sharp", "reason": 42}, {"name": ["esbuild"]}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("package-lock.json"),
        r#"{"packages": {"node_modules/esbuild": {}, "node_modules/sharp": {}}}"#,
    )
    .unwrap();
    let ctx = Context::new(dir.path(), Settings::default());
    let pm = RecordingPm::default();
    let summary = run_trusted_scripts(&ctx, &pm, false).unwrap();
    assert!(summary.selected.is_empty());
    assert!(pm.rebuilt.borrow().is_empty());
}

#[test]
fn nested_install_under_trusted_package_is_rebuilt_in_order() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trusted-packages.json"),
        r#"{"packages": [{"name": "@swc/core", "reason": "native addon"}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("package-lock.json"),
        r#"{"packages": {
            "": {},
            "node_modules/@swc/core": {},
            "node_modules/@swc/core-linux-x64-gnu": {},
            "node_modules/@swc/core/node_modules/@swc/counter": {}
        }}"#,
    )
    .unwrap();

    let ctx = Context::new(dir.path(), Settings::default());
    let pm = RecordingPm::default();
    let summary = run_trusted_scripts(&ctx, &pm, false).unwrap();
    assert_eq!(
        *pm.rebuilt.borrow(),
        vec!["@swc/core", "@swc/core/node_modules/@swc/counter"]
    );
    assert_eq!(summary.rebuilt.len(), 2);
}
