//! `package-lock.json` reader.
//!
//! Only the parts of the lockfile lockwarden needs are extracted: the
//! package key, the derived package name, and the optional `integrity`
//! digest. Lockfile v2/v3 files carry a flat `packages` mapping keyed by
//! install path; v1 files only have a nested `dependencies` tree, which is
//! flattened depth-first into the same shape.

use crate::error::{GuardError, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Maximum lockfile size (50 MB). Large monorepo lockfiles reach tens of MB.
pub const MAX_LOCKFILE_BYTES: u64 = 50 * 1024 * 1024;

const NODE_MODULES: &str = "node_modules/";

/// One installed package as recorded in the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    /// Key in the lockfile's package mapping, e.g. `node_modules/@scope/pkg`.
    pub path: String,
    /// `path` without its leading `node_modules/`.
    pub name: String,
    pub integrity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Lockfile {
    pub lockfile_version: Option<u64>,
    /// Non-root entries in lockfile order.
    pub entries: Vec<LockEntry>,
    /// Hex SHA-256 of the raw lockfile bytes.
    pub sha256: String,
}

impl Lockfile {
    /// Reads and parses the lockfile at `path`. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match crate::fs_guard::read_optional(path, MAX_LOCKFILE_BYTES)? {
            Some(bytes) => Self::parse(&bytes, path).map(Some),
            None => Ok(None),
        }
    }

    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        let doc: Value =
            serde_json::from_slice(bytes).map_err(|e| GuardError::malformed("lockfile", path, e))?;
        let root = doc
            .as_object()
            .ok_or_else(|| GuardError::malformed("lockfile", path, "top level is not an object"))?;

        let mut entries = Vec::new();
        if let Some(packages) = root.get("packages") {
            let packages = packages.as_object().ok_or_else(|| {
                GuardError::malformed("lockfile", path, "`packages` is not an object")
            })?;
            for (key, meta) in packages {
                if key.is_empty() {
                    continue;
                }
                entries.push(LockEntry {
                    path: key.clone(),
                    name: installed_name(key).to_string(),
                    integrity: integrity_of(meta),
                });
            }
        } else if let Some(deps) = root.get("dependencies") {
            let deps = deps.as_object().ok_or_else(|| {
                GuardError::malformed("lockfile", path, "`dependencies` is not an object")
            })?;
            flatten_v1(deps, "", &mut entries);
        }

        Ok(Self {
            lockfile_version: root.get("lockfileVersion").and_then(Value::as_u64),
            entries,
            sha256: hex::encode(Sha256::digest(bytes)),
        })
    }

    /// Installed package names in lockfile order.
    pub fn installed_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// Strips one leading `node_modules/` from a lockfile key.
pub fn installed_name(key: &str) -> &str {
    key.strip_prefix(NODE_MODULES).unwrap_or(key)
}

fn integrity_of(meta: &Value) -> Option<String> {
    meta.get("integrity")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

fn flatten_v1(deps: &Map<String, Value>, parent: &str, out: &mut Vec<LockEntry>) {
    for (name, meta) in deps {
        let path = format!("{parent}{NODE_MODULES}{name}");
        out.push(LockEntry {
            name: installed_name(&path).to_string(),
            integrity: integrity_of(meta),
            path: path.clone(),
        });
        if let Some(nested) = meta.get("dependencies").and_then(Value::as_object) {
            flatten_v1(nested, &format!("{path}/"), out);
        }
    }
}
