//! # lockwarden
//!
//! A supply-chain gate for npm projects, run before the build:
//!
//! - `lockwarden verify` checks the security configuration (`.npmrc`),
//!   lockfile integrity coverage, the vulnerability audit, registry signature
//!   support and the trusted-packages policy, then reports one verdict.
//! - `lockwarden run-trusted` re-runs install scripts (`npm rebuild`) for
//!   exactly the installed packages on the trusted-packages allow-list.
//!
//! lockwarden is a policy layer, not a package manager. Auditing, signature
//! verification and script execution are delegated to npm; lockwarden only
//! decides what to ask for and how to read the answers.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fs_guard`] | Symlink-safe, size-bounded file reads |
//! | [`settings`] | Tool settings and secure defaults |
//! | [`lockfile`] | `package-lock.json` entries and digests |
//! | [`npmrc`] | `.npmrc` parsing and expected security settings |
//! | [`trust`] | Trusted-packages policy and matching |
//! | [`audit`] | `npm audit --json` severity parsing |
//! | [`package_manager`] | External npm commands behind a trait |
//! | [`checks`] | The five verifier checks |
//! | [`verify`] | Verifier orchestration and verdict |
//! | [`runner`] | Allow-list gated script execution |
//! | [`report`] | Colorized console report |

/// Severity breakdown parsed from `npm audit --json`.
pub mod audit;

/// The five verifier checks and the shared [`Context`] they run against.
pub mod checks;

/// Error type shared by the library.
pub mod error;

/// Symlink-safe, size-bounded file reads. Every project file lockwarden
/// reads goes through here.
pub mod fs_guard;

/// `package-lock.json` entries, integrity digests and the lockfile fingerprint.
pub mod lockfile;

/// `.npmrc` parsing and the required and recommended security settings.
pub mod npmrc;

/// npm invocations behind the [`PackageManager`] trait.
pub mod package_manager;

/// Colorized console output.
pub mod report;

/// Allow-list gated `npm rebuild`.
pub mod runner;

/// Tool settings (`lockwarden.json`) with secure defaults.
pub mod settings;

/// The trusted-packages policy and package matching.
pub mod trust;

/// Runs the verifier checks and combines them into one verdict.
pub mod verify;

pub use checks::{CheckKind, CheckReport, Context, Status};
pub use error::{GuardError, Result};
pub use package_manager::{Npm, PackageManager};
pub use settings::Settings;
