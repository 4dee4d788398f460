use super::{CheckKind, CheckReport, Context};
use crate::lockfile::Lockfile;

/// Digest coverage of a lockfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityStats {
    pub total: usize,
    pub with_digest: usize,
    /// Digests carrying the strong-hash prefix.
    pub strong: usize,
    /// Lockfile keys of entries without a digest, in lockfile order.
    pub missing: Vec<String>,
}

impl IntegrityStats {
    pub fn from_lockfile(lock: &Lockfile, strong_prefix: &str) -> Self {
        let mut stats = Self::default();
        for entry in &lock.entries {
            stats.total += 1;
            match entry.integrity.as_deref() {
                Some(digest) => {
                    stats.with_digest += 1;
                    if digest.starts_with(strong_prefix) {
                        stats.strong += 1;
                    }
                }
                None => stats.missing.push(entry.path.clone()),
            }
        }
        stats
    }

    pub fn is_complete(&self) -> bool {
        self.with_digest == self.total
    }

    /// Whether at least `percent`% of entries carry a digest.
    pub fn meets(&self, percent: u32) -> bool {
        self.with_digest * 100 >= self.total * percent as usize
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.with_digest as f64 * 100.0 / self.total as f64
        }
    }
}

/// Checks that lockfile entries carry integrity digests.
///
/// 100% coverage passes, coverage at or above the configured minimum passes
/// with a warning, anything lower fails. A missing lockfile fails.
pub fn check_integrity(ctx: &Context) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Integrity);
    let path = ctx.lockfile_path();
    let name = ctx.display_name(&path);

    let lock = match Lockfile::load(&path) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            report.fail(format!(
                "{name} not found; run `npm install` to generate it and commit the result"
            ));
            return report;
        }
        Err(e) => {
            report.fail(e.to_string());
            return report;
        }
    };

    report.info(format!("{name} sha256: {}", lock.sha256));
    if let Some(v) = lock.lockfile_version {
        report.info(format!("lockfileVersion {v}"));
    }

    let settings = &ctx.settings;
    let stats = IntegrityStats::from_lockfile(&lock, &settings.strong_hash_prefix);
    if stats.total == 0 {
        report.info("no installed packages recorded");
        return report;
    }

    let summary = format!(
        "{}/{} packages have integrity digests ({:.1}%)",
        stats.with_digest,
        stats.total,
        stats.coverage_percent()
    );
    if stats.is_complete() {
        report.info(summary);
    } else if stats.meets(settings.min_integrity_coverage) {
        report.warn(summary);
    } else {
        report.fail(format!(
            "{summary}, below the {}% minimum",
            settings.min_integrity_coverage
        ));
    }

    let weak = stats.with_digest - stats.strong;
    if weak > 0 {
        report.warn(format!(
            "{weak} digest(s) do not use {}",
            settings.strong_hash_prefix.trim_end_matches('-')
        ));
    } else {
        report.info(format!(
            "all digests use {}",
            settings.strong_hash_prefix.trim_end_matches('-')
        ));
    }

    if !stats.missing.is_empty() {
        let preview = settings.missing_preview;
        let mut listing: Vec<String> = stats
            .missing
            .iter()
            .take(preview)
            .map(|p| format!("  - {p}"))
            .collect();
        if stats.missing.len() > preview {
            listing.push(format!("  ... and {} more", stats.missing.len() - preview));
        }
        tracing::debug!("entries without integrity: {:?}", stats.missing);
        report.info(format!("missing digests:\n{}", listing.join("\n")));
    }

    report
}
