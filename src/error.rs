//! Error types for lockwarden.
//!
//! Failures that a check can absorb (a malformed lockfile, an unreachable
//! audit command) are turned into a failing [`crate::checks::CheckReport`]
//! by the verifier. The script runner propagates them to `main`, where any
//! error means exit code 1.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    /// A required input file (lockfile, trust policy) does not exist.
    #[error("{what} not found: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    /// An input file exists but could not be parsed.
    #[error("{what} is malformed ({}): {reason}", .path.display())]
    Malformed {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("Refusing to read symlink: {}", .0.display())]
    Symlink(PathBuf),

    #[error("File too large: {} ({size} bytes, max {max} bytes)", .path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The package manager binary could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The package manager ran but reported failure where output was needed.
    #[error("`{command}` exited with code {code}: {stderr}")]
    ToolFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("rebuild of `{package}` failed with exit code {code}")]
    RebuildFailed { package: String, code: i32 },

    #[error("rebuild of `{package}` timed out after {}s", .timeout.as_secs())]
    RebuildTimeout { package: String, timeout: Duration },

    #[error("invalid settings: {0}")]
    Settings(String),
}

impl GuardError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(what: &'static str, path: &Path, reason: impl ToString) -> Self {
        Self::Malformed {
            what,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
