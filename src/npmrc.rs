//! `.npmrc` parsing and the security settings lockwarden expects in it.

use std::collections::BTreeMap;

/// A setting the security configuration should carry.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedSetting {
    pub key: &'static str,
    /// Values that satisfy the expectation, compared case-insensitively.
    pub accepted: &'static [&'static str],
    pub purpose: &'static str,
}

pub const REQUIRED_SETTINGS: &[ExpectedSetting] = &[
    ExpectedSetting {
        key: "ignore-scripts",
        accepted: &["true"],
        purpose: "block install scripts by default",
    },
    ExpectedSetting {
        key: "audit-level",
        accepted: &["high", "critical"],
        purpose: "fail installs on high-severity advisories",
    },
    ExpectedSetting {
        key: "package-lock",
        accepted: &["true"],
        purpose: "always write and honor the lockfile",
    },
    ExpectedSetting {
        key: "strict-ssl",
        accepted: &["true"],
        purpose: "refuse registries with invalid certificates",
    },
];

pub const RECOMMENDED_SETTINGS: &[ExpectedSetting] = &[
    ExpectedSetting {
        key: "save-exact",
        accepted: &["true"],
        purpose: "pin exact versions when adding dependencies",
    },
    ExpectedSetting {
        key: "engine-strict",
        accepted: &["true"],
        purpose: "refuse packages that declare an incompatible engine",
    },
];

/// How a configuration compares against one [`ExpectedSetting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingState {
    Satisfied,
    Missing,
    /// Present with a value outside `accepted`.
    Mismatched(String),
}

/// Parsed `key=value` configuration. Later assignments win, as in npm.
#[derive(Debug, Clone, Default)]
pub struct NpmConfig {
    values: BTreeMap<String, String>,
}

impl NpmConfig {
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("ignoring .npmrc line without '=': {line}");
                continue;
            };
            values.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn check(&self, expected: &ExpectedSetting) -> SettingState {
        match self.get(expected.key) {
            None => SettingState::Missing,
            Some(v) if expected.accepted.iter().any(|a| a.eq_ignore_ascii_case(v)) => {
                SettingState::Satisfied
            }
            Some(v) => SettingState::Mismatched(v.to_string()),
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
