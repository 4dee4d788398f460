use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum settings file size (1 MB).
const MAX_SETTINGS_BYTES: u64 = 1024 * 1024;

/// Name of the optional settings file looked up in the project directory.
pub const SETTINGS_FILE: &str = "lockwarden.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Package manager executable (name on `$PATH` or absolute path).
    pub package_manager: String,
    pub lockfile: String,
    /// Lockfiles written by other runtimes; only used to improve the
    /// "lockfile missing" warning.
    pub alternative_lockfiles: Vec<String>,
    pub security_config: String,
    pub trust_policy: String,
    /// Digest prefix counted as a strong hash.
    pub strong_hash_prefix: String,
    /// Minimum digest coverage (percent) that still passes with a warning.
    pub min_integrity_coverage: u32,
    /// Number of packages without a digest listed before truncating.
    pub missing_preview: usize,
    /// Severity passed to the threshold-mode audit fallback.
    pub audit_level: String,
    /// First package manager version with `audit signatures`.
    pub min_signature_version: String,
    pub verify_signatures: bool,
    pub review_max_age_days: i64,
    pub rebuild_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            package_manager: "npm".to_string(),
            lockfile: "package-lock.json".to_string(),
            alternative_lockfiles: vec!["bun.lockb".to_string(), "bun.lock".to_string()],
            security_config: ".npmrc".to_string(),
            trust_policy: "trusted-packages.json".to_string(),
            strong_hash_prefix: "sha512-".to_string(),
            min_integrity_coverage: 95,
            missing_preview: 10,
            audit_level: "high".to_string(),
            min_signature_version: "8.15.0".to_string(),
            verify_signatures: true,
            review_max_age_days: 90,
            rebuild_timeout_secs: 120,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(p) = path else {
            return Ok(Self::default());
        };
        let bytes = crate::fs_guard::read_validated(p, MAX_SETTINGS_BYTES)?;
        let settings: Self = serde_json::from_slice(&bytes)
            .map_err(|e| GuardError::malformed("settings file", p, e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolves the settings for a project: an explicit path wins, then
    /// `lockwarden.json` in `base_dir`, then the defaults.
    pub fn discover(base_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if explicit.is_some() {
            return Self::load(explicit);
        }
        let candidate = base_dir.join(SETTINGS_FILE);
        if candidate.exists() {
            tracing::debug!("using settings from {}", candidate.display());
            Self::load(Some(&candidate))
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.package_manager.trim().is_empty() {
            return Err(GuardError::Settings("package_manager must not be empty".into()));
        }
        if self.min_integrity_coverage > 100 {
            return Err(GuardError::Settings(format!(
                "min_integrity_coverage must be 0..=100, got {}",
                self.min_integrity_coverage
            )));
        }
        if self.rebuild_timeout_secs == 0 {
            return Err(GuardError::Settings(
                "rebuild_timeout_secs must be greater than zero".into(),
            ));
        }
        semver::Version::parse(&self.min_signature_version).map_err(|e| {
            GuardError::Settings(format!(
                "min_signature_version `{}` is not a version: {e}",
                self.min_signature_version
            ))
        })?;
        Ok(())
    }

    pub fn rebuild_timeout(&self) -> Duration {
        Duration::from_secs(self.rebuild_timeout_secs)
    }
}
