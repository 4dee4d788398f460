use super::{CheckKind, CheckReport, Context};
use crate::audit::{AuditSummary, AuditVerdict};
use crate::package_manager::PackageManager;
use tracing::{debug, warn};

/// Runs the package manager's vulnerability audit.
///
/// npm exits non-zero whenever it finds vulnerabilities, so the exit code of
/// `audit --json` is ignored and its output parsed. Only when that output is
/// unusable (or the command cannot start) is the threshold-mode audit run,
/// and then its exit code decides: success is a warning because the
/// severity breakdown could not be read, failure fails the check.
pub fn check_audit(ctx: &Context, pm: &dyn PackageManager) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Audit);

    match pm.audit_json() {
        Ok(out) => {
            debug!("audit --json exited with {:?}", out.exit_code);
            match AuditSummary::parse(&out.stdout) {
                Ok(summary) => {
                    record_summary(&mut report, &summary);
                    return report;
                }
                Err(e) => {
                    warn!("unusable audit output: {e}");
                    report.warn(format!("structured audit output unusable: {e}"));
                }
            }
        }
        Err(e) => {
            warn!("audit --json could not run: {e}");
            report.warn(format!("structured audit unavailable: {e}"));
        }
    }

    let level = &ctx.settings.audit_level;
    match pm.audit_at_level(level) {
        Ok(out) if out.success => report.warn(format!(
            "fallback `audit --audit-level={level}` passed; severity counts unavailable"
        )),
        Ok(out) => {
            let mut msg = format!(
                "fallback `audit --audit-level={level}` reported vulnerabilities (exit code {})",
                out.exit_code.unwrap_or(-1)
            );
            if let Some(line) = out.stderr.lines().find(|l| !l.trim().is_empty()) {
                msg.push_str(&format!(": {}", line.trim()));
            }
            report.fail(msg);
        }
        Err(e) => report.fail(format!("audit could not be run: {e}")),
    }
    report
}

fn record_summary(report: &mut CheckReport, s: &AuditSummary) {
    report.info(format!(
        "critical: {}, high: {}, moderate: {}, low: {}, info: {}",
        s.critical, s.high, s.moderate, s.low, s.info
    ));
    match s.verdict() {
        AuditVerdict::Blocking => report.fail(format!(
            "{} critical and {} high severity vulnerabilities; run `npm audit` for details",
            s.critical, s.high
        )),
        AuditVerdict::Advisory => report.warn(format!(
            "{} moderate severity vulnerabilities; review with `npm audit`",
            s.moderate
        )),
        AuditVerdict::Clean if s.total() == 0 => report.info("no known vulnerabilities"),
        AuditVerdict::Clean => report.info("no moderate or higher vulnerabilities"),
    }
}
