use super::{CheckKind, CheckReport, Context};
use crate::trust::{parse_review_date, TrustPolicy};
use time::Date;

/// Validates the trusted-packages allow-list.
///
/// Only an unreadable or malformed document fails the check. A missing
/// document, incomplete entries and stale review dates are advisories.
pub fn check_trust_policy(ctx: &Context) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::TrustPolicy);
    let path = ctx.trust_policy_path();
    let name = ctx.display_name(&path);

    let policy = match TrustPolicy::load(&path) {
        Ok(Some(policy)) => policy,
        Ok(None) => {
            report.warn(format!(
                "{name} not found; no package is allowed to run install scripts"
            ));
            return report;
        }
        Err(e) => {
            report.fail(e.to_string());
            return report;
        }
    };

    report.info(format!(
        "{} trusted package(s), review cadence: {}",
        policy.packages.len(),
        policy.review_cadence.as_deref().unwrap_or("unspecified")
    ));

    for (i, entry) in policy.packages.iter().enumerate() {
        if let Some(problem) = &entry.malformed {
            report.warn(format!("entry #{} is malformed and is ignored: {problem}", i + 1));
            continue;
        }
        let label = match entry.name() {
            Some(n) => format!("`{n}`"),
            None => {
                report.warn(format!("entry #{} has no name and is ignored", i + 1));
                format!("#{}", i + 1)
            }
        };
        if !entry.has_reason() {
            report.warn(format!("entry {label} has no reason"));
        }
        if let Some(raw) = entry.last_reviewed.as_deref() {
            match parse_review_date(raw) {
                Some(date) => {
                    let age = days_between(date, ctx.today);
                    if age > ctx.settings.review_max_age_days {
                        report.warn(format!("entry {label} last reviewed {age} days ago"));
                    }
                }
                None => report.warn(format!("entry {label} has unreadable lastReviewed `{raw}`")),
            }
        }
    }

    let max_age = ctx.settings.review_max_age_days;
    match policy.last_reviewed.as_deref() {
        None => report.warn(format!("{name} has no lastReviewed date")),
        Some(raw) => match parse_review_date(raw) {
            None => report.warn(format!("{name} has unreadable lastReviewed `{raw}`")),
            Some(date) => {
                let age = days_between(date, ctx.today);
                if age > max_age {
                    report.warn(format!(
                        "{name} last reviewed {age} days ago (more than {max_age}); schedule a review"
                    ));
                } else {
                    report.info(format!("last reviewed {age} days ago"));
                }
            }
        },
    }

    report
}

fn days_between(earlier: Date, later: Date) -> i64 {
    (later - earlier).whole_days()
}
