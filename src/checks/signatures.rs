use super::{CheckKind, CheckReport, Context};
use crate::package_manager::PackageManager;
use semver::Version;

/// Checks that the package manager can verify registry signatures.
///
/// Never fails: an old npm or a registry without signature support only
/// produces warnings.
pub fn check_signatures(ctx: &Context, pm: &dyn PackageManager) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Signatures);

    let minimum = match Version::parse(&ctx.settings.min_signature_version) {
        Ok(v) => v,
        Err(e) => {
            report.warn(format!(
                "minimum signature version `{}` is invalid: {e}",
                ctx.settings.min_signature_version
            ));
            return report;
        }
    };

    let raw = match pm.version() {
        Ok(raw) => raw,
        Err(e) => {
            report.warn(format!("could not determine npm version: {e}"));
            return report;
        }
    };
    let Some(version) = parse_tool_version(&raw) else {
        report.warn(format!("unrecognized npm version output `{raw}`"));
        return report;
    };

    if version < minimum {
        report.warn(format!(
            "npm {version} cannot verify registry signatures (needs {minimum} or newer)"
        ));
        return report;
    }
    report.info(format!("npm {version} supports `npm audit signatures`"));

    if !ctx.settings.verify_signatures {
        report.info("signature verification disabled in settings");
        return report;
    }

    match pm.audit_signatures() {
        Ok(out) if out.success => report.info("registry signatures verified"),
        Ok(out) => {
            let detail = out
                .stderr
                .lines()
                .chain(out.stdout.lines())
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no output");
            report.warn(format!(
                "`npm audit signatures` failed (exit code {}): {}",
                out.exit_code.unwrap_or(-1),
                detail.trim()
            ));
        }
        Err(e) => report.warn(format!("`npm audit signatures` could not run: {e}")),
    }
    report
}

/// Parses version output such as `10.2.4` or `v9.8.1`.
fn parse_tool_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()
}
