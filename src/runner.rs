//! Selective Script Runner.
//!
//! Projects install with `ignore-scripts=true`, so no dependency's install
//! scripts run by default. This module re-runs them, through
//! `npm rebuild <name>`, for exactly the installed packages the trust policy
//! covers, one at a time and in lockfile order. The first failure aborts the
//! run; nothing outside the allow-list is ever rebuilt.

use crate::checks::Context;
use crate::error::Result;
use crate::lockfile::Lockfile;
use crate::package_manager::PackageManager;
use crate::report;
use crate::trust::{select_trusted, unmatched_entries, TrustPolicy};
use tracing::{info, warn};

/// What a runner invocation did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Installed packages covered by the trust policy, in rebuild order.
    pub selected: Vec<String>,
    /// Packages that were actually rebuilt (empty on a dry run).
    pub rebuilt: Vec<String>,
    /// Trust entries with no installed package.
    pub not_installed: Vec<String>,
    pub lockfile_found: bool,
}

/// Rebuilds every installed package the trust policy allows.
///
/// # Errors
///
/// - The trust policy is missing or malformed (nothing is rebuilt).
/// - The lockfile exists but is malformed.
/// - A rebuild fails or times out; later packages are not attempted.
pub fn run_trusted_scripts(
    ctx: &Context,
    pm: &dyn PackageManager,
    dry_run: bool,
) -> Result<RunSummary> {
    let policy = TrustPolicy::load_required(&ctx.trust_policy_path())?;
    let mut summary = RunSummary::default();

    let lock_path = ctx.lockfile_path();
    let lock = Lockfile::load(&lock_path)?;
    if lock.is_none() {
        let alternatives = ctx.alternative_lockfiles();
        let hint = if alternatives.is_empty() {
            String::new()
        } else {
            format!(
                "; found {} (lockwarden reads {} only)",
                alternatives.join(", "),
                ctx.settings.lockfile
            )
        };
        report::warning(&format!(
            "{} not found, treating installed packages as empty{hint}",
            ctx.display_name(&lock_path)
        ));
    }
    summary.lockfile_found = lock.is_some();

    let matches = match &lock {
        Some(lock) => select_trusted(&policy, lock.installed_names()),
        None => Vec::new(),
    };
    summary.selected = matches.iter().map(|m| m.package.to_string()).collect();
    summary.not_installed = unmatched_entries(&policy, &matches)
        .iter()
        .filter_map(|e| e.name())
        .map(ToString::to_string)
        .collect();

    for name in &summary.not_installed {
        info!("trusted package {name} is not installed");
    }

    if matches.is_empty() {
        report::step("no trusted packages installed; nothing to rebuild");
        return Ok(summary);
    }

    let timeout = ctx.settings.rebuild_timeout();
    let total = matches.len();
    for (i, m) in matches.iter().enumerate() {
        let reason = m.entry.reason.as_deref().unwrap_or("no reason recorded");
        if dry_run {
            report::step(&format!("[{}/{total}] would rebuild {} ({reason})", i + 1, m.package));
            continue;
        }
        report::step(&format!("[{}/{total}] rebuilding {} ({reason})", i + 1, m.package));
        if let Err(e) = pm.rebuild(m.package, timeout) {
            warn!("aborting after failed rebuild of {}", m.package);
            report::failure(&format!("{e}; remaining packages were not rebuilt"));
            return Err(e);
        }
        report::success(&format!("{} rebuilt", m.package));
        summary.rebuilt.push(m.package.to_string());
    }

    Ok(summary)
}
