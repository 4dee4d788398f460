//! The package manager as an external collaborator.
//!
//! lockwarden never reimplements auditing, signature verification or script
//! execution. It calls the package manager's own commands and interprets
//! their exit codes and, for audit, their JSON output. [`PackageManager`] is
//! the narrow seam between policy and process spawning so the checks and
//! the script runner can be exercised against fakes.
//!
//! ## Process handling
//!
//! - Commands are executed via `std::process::Command` (no shell), with the
//!   project directory as the working directory.
//! - Captured stderr is truncated and redacted by [`sanitize_tool_stderr`]
//!   before it reaches any report.
//! - Rebuilds inherit stdout/stderr so operators see npm's native output,
//!   and are killed once their timeout elapses. On Unix each rebuild runs in
//!   its own process group so install scripts it spawned die with it.

use crate::error::{GuardError, Result};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

const MAX_TOOL_ERR_BYTES: usize = 8 * 1024; // 8KB

/// How often a running rebuild is polled for completion.
const REBUILD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captured result of a package manager command.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait PackageManager {
    /// `audit --json`. A non-zero exit is returned as output, not an error:
    /// npm exits non-zero whenever it finds vulnerabilities.
    fn audit_json(&self) -> Result<ToolOutput>;

    /// `audit --audit-level=<level>`, used when structured output is unusable.
    fn audit_at_level(&self, level: &str) -> Result<ToolOutput>;

    /// `audit signatures`.
    fn audit_signatures(&self) -> Result<ToolOutput>;

    /// `--version`, trimmed.
    fn version(&self) -> Result<String>;

    /// `rebuild <package>`, bounded by `timeout`.
    fn rebuild(&self, package: &str, timeout: Duration) -> Result<()>;
}

/// The real npm CLI.
#[derive(Debug, Clone)]
pub struct Npm {
    program: String,
    project_dir: PathBuf,
}

impl Npm {
    pub fn new(program: impl Into<String>, project_dir: &Path) -> Self {
        Self {
            program: program.into(),
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(&self.project_dir);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn capture(&self, args: &[&str]) -> Result<ToolOutput> {
        debug!("running `{}`", self.describe(args));
        let out = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GuardError::Spawn {
                command: self.describe(args),
                source,
            })?;
        Ok(ToolOutput {
            success: out.status.success(),
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: sanitize_tool_stderr(&out.stderr),
        })
    }
}

impl PackageManager for Npm {
    fn audit_json(&self) -> Result<ToolOutput> {
        self.capture(&["audit", "--json"])
    }

    fn audit_at_level(&self, level: &str) -> Result<ToolOutput> {
        let flag = format!("--audit-level={level}");
        self.capture(&["audit", &flag])
    }

    fn audit_signatures(&self) -> Result<ToolOutput> {
        self.capture(&["audit", "signatures"])
    }

    fn version(&self) -> Result<String> {
        let args = ["--version"];
        let out = self.capture(&args)?;
        if !out.success {
            return Err(GuardError::ToolFailed {
                command: self.describe(&args),
                code: out.exit_code.unwrap_or(-1),
                stderr: out.stderr,
            });
        }
        Ok(out.stdout.trim().to_string())
    }

    fn rebuild(&self, package: &str, timeout: Duration) -> Result<()> {
        let args = ["rebuild", package];
        debug!("running `{}` (timeout {}s)", self.describe(&args), timeout.as_secs());
        let mut cmd = self.command(&args);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| GuardError::Spawn {
                command: self.describe(&args),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            let status = child.try_wait().map_err(|source| GuardError::Spawn {
                command: self.describe(&args),
                source,
            })?;
            match status {
                Some(status) if status.success() => return Ok(()),
                Some(status) => {
                    return Err(GuardError::RebuildFailed {
                        package: package.to_string(),
                        code: status.code().unwrap_or(-1),
                    })
                }
                None if Instant::now() >= deadline => {
                    warn!("rebuild of {package} exceeded {}s, killing it", timeout.as_secs());
                    terminate(&mut child, package);
                    return Err(GuardError::RebuildTimeout {
                        package: package.to_string(),
                        timeout,
                    });
                }
                None => thread::sleep(REBUILD_POLL_INTERVAL),
            }
        }
    }
}

/// Kills a timed-out rebuild along with every process in its group.
fn terminate(child: &mut Child, package: &str) {
    #[cfg(unix)]
    {
        #[allow(clippy::cast_possible_wrap)]
        let pgid = nix::unistd::Pid::from_raw(child.id() as i32);
        if let Err(e) = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL) {
            warn!(error = %e, "failed to kill process group of rebuild for {package}");
        }
    }
    if let Err(e) = child.kill() {
        warn!(error = %e, "failed to kill rebuild of {package}; it may still be running");
    }
    if let Err(e) = child.wait() {
        warn!(error = %e, "failed to reap rebuild of {package}");
    }
}

/// Truncates tool stderr and redacts credentials npm is known to echo.
pub fn sanitize_tool_stderr(stderr: &[u8]) -> String {
    let mut s = String::from_utf8_lossy(stderr).to_string();
    if s.len() > MAX_TOOL_ERR_BYTES {
        let mut cut = MAX_TOOL_ERR_BYTES;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("\n[TRUNCATED]");
    }

    let patterns = [
        (r"(?i)(_authToken|_auth|_password)\s*=\s*\S+", "$1=[REDACTED]"),
        (r"npm_[A-Za-z0-9]{36}", "npm_****************"),
        (r"(?i)ghp_[A-Za-z0-9]{30,60}", "ghp_****************"),
        (r"(?i)bearer\s+[a-z0-9\-_\.=]{1,500}", "bearer [REDACTED]"),
        (r"(?i)\b(password|token)\s*[:=]\s*\S+", "[REDACTED]=[REDACTED]"),
        (r"://[^/\s:@]+:[^/\s@]+@", "://[REDACTED]@"),
    ];
    for (pat, repl) in patterns {
        if let Ok(re) = Regex::new(pat) {
            s = re.replace_all(&s, repl).to_string();
        }
    }

    // Redact lines that are bare absolute paths (npm's debug-log pointers).
    s.lines()
        .map(|line| {
            if line.trim_start().starts_with('/') {
                "[REDACTED_PATH]"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
