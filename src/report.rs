//! Human-readable console output.
//!
//! Not a machine-readable contract: wording and layout may change.

use crate::checks::{CheckReport, Level, Status};
use crate::verify::VerificationResult;
use colored::Colorize;

pub fn step(msg: &str) {
    println!("{} {msg}", "→".cyan());
}

pub fn success(msg: &str) {
    println!("{} {msg}", "✓".green());
}

pub fn warning(msg: &str) {
    eprintln!("{} {msg}", "⚠".yellow());
}

pub fn failure(msg: &str) {
    eprintln!("{} {msg}", "✗".red());
}

fn status_label(status: Status) -> colored::ColoredString {
    match status {
        Status::Pass => "PASS".green().bold(),
        Status::Warn => "WARN".yellow().bold(),
        Status::Fail => "FAIL".red().bold(),
    }
}

fn print_check(report: &CheckReport) {
    println!();
    println!(
        "{} {}",
        format!("== {} ==", report.kind.title()).bold(),
        status_label(report.status)
    );
    for d in &report.diagnostics {
        let mut lines = d.message.lines();
        let first = lines.next().unwrap_or_default();
        match d.level {
            Level::Info => println!("  {} {first}", "·".dimmed()),
            Level::Warning => println!("  {} {first}", "⚠".yellow()),
            Level::Error => println!("  {} {first}", "✗".red()),
        }
        for rest in lines {
            println!("    {rest}");
        }
    }
}

/// Prints every check followed by a summary table and the overall verdict.
pub fn print_verification(result: &VerificationResult) {
    println!("{}", format!("lockwarden v{}", env!("CARGO_PKG_VERSION")).bold());
    for report in &result.reports {
        print_check(report);
    }

    println!();
    println!("{}", "Summary".bold());
    for report in &result.reports {
        println!("  {:<26} {}", report.kind.title(), status_label(report.status));
    }
    println!();

    let warnings = result.count(Status::Warn);
    if result.passed() {
        if warnings > 0 {
            success(&format!("supply-chain verification passed with {warnings} warning(s)"));
        } else {
            success("supply-chain verification passed");
        }
    } else {
        failure(&format!(
            "supply-chain verification failed: {} check(s) failed",
            result.count(Status::Fail)
        ));
    }
}
