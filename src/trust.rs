//! Trust policy: the maintainer-curated allow-list of packages whose install
//! scripts may run.
//!
//! The document is read-only to lockwarden. Matching is deliberately narrow:
//! an installed package matches an entry when the names are equal or when
//! the installed name continues the entry name with a `/` (nested installs
//! under a trusted package). `foo-bar` never matches `foo`, and
//! `@scope/foo` never matches `foo`.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

/// Maximum trust policy size (1 MB).
const MAX_TRUST_POLICY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustPolicy {
    #[serde(default)]
    pub last_reviewed: Option<String>,
    #[serde(default)]
    pub review_cadence: Option<String>,
    /// A badly shaped entry does not reject the document; it is kept with
    /// [`TrustEntry::malformed`] set and never matches anything.
    #[serde(default, deserialize_with = "tolerant_entries")]
    pub packages: Vec<TrustEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustEntry {
    #[serde(default)]
    pub name: Option<String>,
    /// Why the package is allowed to run scripts.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub last_reviewed: Option<String>,
    /// Why the entry could not be read, if it could not.
    #[serde(skip)]
    pub malformed: Option<String>,
}

/// Reads `packages` entry by entry so one bad entry only disables itself.
fn tolerant_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<TrustEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e: serde_json::Error| TrustEntry {
                malformed: Some(e.to_string()),
                ..TrustEntry::default()
            })
        })
        .collect())
}

impl TrustPolicy {
    /// Reads the policy at `path`. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match crate::fs_guard::read_optional(path, MAX_TRUST_POLICY_BYTES)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| GuardError::malformed("trust policy", path, e)),
            None => Ok(None),
        }
    }

    /// Like [`TrustPolicy::load`], but absence is an error.
    pub fn load_required(path: &Path) -> Result<Self> {
        Self::load(path)?.ok_or_else(|| GuardError::MissingInput {
            what: "trust policy",
            path: path.to_path_buf(),
        })
    }

    pub fn last_reviewed_date(&self) -> Option<Date> {
        self.last_reviewed.as_deref().and_then(parse_review_date)
    }
}

impl TrustEntry {
    /// The entry name if it is usable for matching.
    pub fn name(&self) -> Option<&str> {
        if self.malformed.is_some() {
            return None;
        }
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn has_reason(&self) -> bool {
        self.reason.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Whether `installed` (a lockfile package name) is covered by this entry.
    pub fn matches(&self, installed: &str) -> bool {
        let Some(name) = self.name() else {
            return false;
        };
        if !is_clean_package_path(installed) {
            return false;
        }
        installed == name
            || installed
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// An installed package selected for script execution.
#[derive(Debug, Clone, Copy)]
pub struct TrustedMatch<'a> {
    pub package: &'a str,
    pub entry: &'a TrustEntry,
}

/// Returns the installed packages covered by `policy`, in the order given.
pub fn select_trusted<'a, I>(policy: &'a TrustPolicy, installed: I) -> Vec<TrustedMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    installed
        .into_iter()
        .filter_map(|package| {
            policy
                .packages
                .iter()
                .find(|entry| entry.matches(package))
                .map(|entry| TrustedMatch { package, entry })
        })
        .collect()
}

/// Trust entries that matched none of the installed packages.
pub fn unmatched_entries<'a>(
    policy: &'a TrustPolicy,
    matches: &[TrustedMatch<'_>],
) -> Vec<&'a TrustEntry> {
    policy
        .packages
        .iter()
        .filter(|entry| entry.name().is_some())
        .filter(|entry| !matches.iter().any(|m| std::ptr::eq(m.entry, *entry)))
        .collect()
}

/// Parses `YYYY-MM-DD`, falling back to a full RFC 3339 timestamp.
pub fn parse_review_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|dt| dt.date()))
}

/// Rejects names npm would read as a flag or that climb out of `node_modules`.
fn is_clean_package_path(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}
