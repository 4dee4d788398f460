//! The five verifier checks and the types they report with.
//!
//! Every check takes an explicit [`Context`] instead of reading the process
//! working directory, and never returns an error: anything that goes wrong
//! inside a check becomes a failing [`CheckReport`] so the remaining checks
//! still run.

pub mod audit;
pub mod config;
pub mod integrity;
pub mod signatures;
pub mod trust_policy;

use crate::settings::Settings;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};

pub use audit::check_audit;
pub use config::check_configuration;
pub use integrity::{check_integrity, IntegrityStats};
pub use signatures::check_signatures;
pub use trust_policy::check_trust_policy;

/// Inputs shared by every check.
#[derive(Debug, Clone)]
pub struct Context {
    pub base_dir: PathBuf,
    pub settings: Settings,
    /// Reference date for review-age calculations.
    pub today: Date,
}

impl Context {
    pub fn new(base_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings,
            today: OffsetDateTime::now_utc().date(),
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.base_dir.join(&self.settings.lockfile)
    }

    pub fn security_config_path(&self) -> PathBuf {
        self.base_dir.join(&self.settings.security_config)
    }

    pub fn trust_policy_path(&self) -> PathBuf {
        self.base_dir.join(&self.settings.trust_policy)
    }

    /// Lockfiles of other runtimes present in the project directory.
    pub fn alternative_lockfiles(&self) -> Vec<&str> {
        self.settings
            .alternative_lockfiles
            .iter()
            .map(String::as_str)
            .filter(|name| self.base_dir.join(name).is_file())
            .collect()
    }

    pub fn display_name<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Configuration,
    Integrity,
    Audit,
    Signatures,
    TrustPolicy,
}

impl CheckKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Configuration => "Security configuration",
            Self::Integrity => "Lockfile integrity",
            Self::Audit => "Vulnerability audit",
            Self::Signatures => "Registry signatures",
            Self::TrustPolicy => "Trusted packages policy",
        }
    }
}

/// Outcome of one check. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Pass,
    /// Passed, with advisories.
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub status: Status,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            status: Status::Pass,
            diagnostics: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status != Status::Fail
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, Status::Pass, message.into());
    }

    /// Records an advisory. Never turns the check into a failure.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, Status::Warn, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.push(Level::Error, Status::Fail, message.into());
    }

    fn push(&mut self, level: Level, status: Status, message: String) {
        self.status = self.status.max(status);
        self.diagnostics.push(Diagnostic { level, message });
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message.contains(needle))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_never_downgrades_failure() {
        let mut r = CheckReport::new(CheckKind::Audit);
        r.fail("boom");
        r.warn("advisory");
        r.info("detail");
        assert_eq!(r.status, Status::Fail);
        assert!(!r.passed());
    }

    #[test]
    fn test_warn_still_passes() {
        let mut r = CheckReport::new(CheckKind::TrustPolicy);
        r.warn("stale");
        assert_eq!(r.status, Status::Warn);
        assert!(r.passed());
    }
}
