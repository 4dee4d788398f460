use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use lockwarden::{report, runner, verify, Context, Npm, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `lockwarden=debug`).
const LOG_ENV: &str = "LOCKWARDEN_LOG";

#[derive(Parser)]
#[command(
    name = "lockwarden",
    about = "Lockfile integrity, audit and trusted-script gate for npm projects",
    version
)]
struct Cli {
    /// Project directory containing package-lock.json
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Settings file (defaults to <dir>/lockwarden.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the integrity, audit, signature, configuration and trust checks
    Verify,

    /// Rebuild (run install scripts for) trusted installed packages only
    RunTrusted {
        /// List the packages that would be rebuilt without running anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = match Settings::discover(&cli.dir, cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            report::failure(&format!("invalid lockwarden settings: {e}"));
            if matches!(cli.cmd, Cmd::Verify) {
                report::failure("supply-chain verification failed: no checks were run");
            }
            return Err(e).context("loading lockwarden settings");
        }
    };
    let ctx = Context::new(cli.dir, settings);
    let npm = Npm::new(ctx.settings.package_manager.clone(), &ctx.base_dir);

    match cli.cmd {
        Cmd::Verify => run_verify(&ctx, &npm),
        Cmd::RunTrusted { dry_run } => run_trusted(&ctx, &npm, dry_run),
    }
}

fn run_verify(ctx: &Context, npm: &Npm) -> Result<()> {
    let result = verify::run_verification(ctx, npm);
    report::print_verification(&result);
    if !result.passed() {
        return Err(anyhow!("supply-chain verification failed"));
    }
    Ok(())
}

fn run_trusted(ctx: &Context, npm: &Npm, dry_run: bool) -> Result<()> {
    let summary = runner::run_trusted_scripts(ctx, npm, dry_run)
        .context("running trusted install scripts")?;

    if !summary.not_installed.is_empty() {
        report::step(&format!(
            "trusted but not installed: {}",
            summary.not_installed.join(", ")
        ));
    }
    if dry_run {
        report::success(&format!(
            "{} trusted package(s) would be rebuilt",
            summary.selected.len()
        ));
    } else {
        report::success(&format!(
            "{} trusted package(s) rebuilt",
            summary.rebuilt.len()
        ));
    }
    Ok(())
}
