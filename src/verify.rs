//! The Integrity & Policy Verifier: five independent checks and one verdict.

use crate::checks::{
    check_audit, check_configuration, check_integrity, check_signatures, check_trust_policy,
    CheckKind, CheckReport, Context, Status,
};
use crate::package_manager::PackageManager;
use tracing::info;

/// Outcome of one verifier run.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub reports: Vec<CheckReport>,
}

impl VerificationResult {
    /// Logical AND of every check. Warnings pass.
    pub fn passed(&self) -> bool {
        self.reports.iter().all(CheckReport::passed)
    }

    pub fn get(&self, kind: CheckKind) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }

    pub fn count(&self, status: Status) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Runs every check against the project in `ctx.base_dir`.
pub fn run_verification(ctx: &Context, pm: &dyn PackageManager) -> VerificationResult {
    info!("verifying {}", ctx.base_dir.display());

    let reports = vec![
        check_configuration(ctx),
        check_integrity(ctx),
        check_audit(ctx, pm),
        check_signatures(ctx, pm),
        check_trust_policy(ctx),
    ];
    for r in &reports {
        info!("{}: {:?}", r.kind.title(), r.status);
    }
    VerificationResult { reports }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checks::testing::{context, output, FakePm};
    use std::fs;
    use tempfile::TempDir;
    use time::Duration;

    fn hardened_project(dir: &std::path::Path) {
        fs::write(
            dir.join(".npmrc"),
            "ignore-scripts=true\naudit-level=high\npackage-lock=true\nstrict-ssl=true\nsave-exact=true\nengine-strict=true\n",
        )
        .unwrap();
        fs::write(
            dir.join("package-lock.json"),
            r#"{"lockfileVersion": 3, "packages": {"": {}, "node_modules/esbuild": {"integrity": "sha512-x"}}}"#,
        )
        .unwrap();
    }

    fn write_policy(ctx: &Context, days_ago: i64) {
        let date = ctx.today - Duration::days(days_ago);
        fs::write(
            ctx.trust_policy_path(),
            format!(
                r#"{{"lastReviewed": "{date}", "reviewCadence": "quarterly",
                    "packages": [{{"name": "esbuild", "reason": "platform binary"}}]}}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_clean_project_passes_all_checks() {
        let dir = TempDir::new().unwrap();
        hardened_project(dir.path());
        let ctx = context(dir.path());
        write_policy(&ctx, 5);

        let pm = FakePm::default();
        let result = run_verification(&ctx, &pm);
        assert!(result.passed());
        assert_eq!(result.reports.len(), 5);
        assert_eq!(result.count(Status::Pass), 5, "{:#?}", result.reports);
        // One npm invocation per question; no separate launch check.
        assert_eq!(pm.calls(), vec!["audit --json", "--version", "audit signatures"]);
    }

    #[test]
    fn test_missing_lockfile_fails_only_integrity() {
        let dir = TempDir::new().unwrap();
        hardened_project(dir.path());
        fs::remove_file(dir.path().join("package-lock.json")).unwrap();
        let ctx = context(dir.path());
        write_policy(&ctx, 5);

        let pm = FakePm::default();
        let result = run_verification(&ctx, &pm);
        assert!(!result.passed());
        assert_eq!(result.get(CheckKind::Integrity).unwrap().status, Status::Fail);
        for kind in [
            CheckKind::Configuration,
            CheckKind::Audit,
            CheckKind::Signatures,
            CheckKind::TrustPolicy,
        ] {
            assert!(result.get(kind).unwrap().passed(), "{kind:?} should pass");
        }
        // Audit and signatures still ran.
        assert!(pm.calls().contains(&"audit --json".to_string()));
        assert!(pm.calls().contains(&"audit signatures".to_string()));
    }

    #[test]
    fn test_stale_policy_does_not_change_verdict() {
        let dir = TempDir::new().unwrap();
        hardened_project(dir.path());
        let ctx = context(dir.path());
        write_policy(&ctx, 120);

        let result = run_verification(&ctx, &FakePm::default());
        assert!(result.passed());
        assert_eq!(
            result.get(CheckKind::TrustPolicy).unwrap().status,
            Status::Warn
        );
    }

    #[test]
    fn test_high_vulnerability_fails_verdict() {
        let dir = TempDir::new().unwrap();
        hardened_project(dir.path());
        let ctx = context(dir.path());
        write_policy(&ctx, 5);
        let pm = FakePm {
            audit_json: Some(output(
                false,
                r#"{"metadata":{"vulnerabilities":{"high":1}}}"#,
            )),
            ..FakePm::default()
        };
        let result = run_verification(&ctx, &pm);
        assert!(!result.passed());
        assert_eq!(result.count(Status::Fail), 1);
    }
}
