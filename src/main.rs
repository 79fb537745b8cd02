use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ci_release::cli::orchestration::{self, ReleaseWorkflowArgs};
use ci_release::config::{self, ReleaseOverrides};
use ci_release::ui;

#[derive(clap::Parser)]
#[command(
    name = "ci-release",
    version,
    about = "Resolve the next semantic version in CI and create the release commit and tag"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, default_value = ".", help = "Path inside the repository to release")]
    repo: PathBuf,

    #[arg(short, long, help = "Branch to release from (defaults to CI branch, then HEAD)")]
    branch: Option<String>,

    #[arg(long, help = "Request a prerelease on prerelease-capable branches")]
    prerelease: bool,

    #[arg(long, help = "Override the prerelease token of every prerelease-capable branch")]
    prerelease_token: Option<String>,

    #[arg(long, help = "Push the release commit and tag to the configured remote")]
    push: bool,

    #[arg(long, help = "Preview the release without changing the repository")]
    dry_run: bool,

    #[arg(long, help = "Write the result record as TOML to this file")]
    summary: Option<PathBuf>,

    #[arg(long, default_value = "info", help = "Log level when RUST_LOG is not set")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = config::load_config(args.config.as_deref(), &args.repo)
        .context("Error loading config")?;
    if args.push {
        config.release.push = true;
    }

    let workflow_args = ReleaseWorkflowArgs {
        repo_path: args.repo,
        branch: args.branch,
        overrides: ReleaseOverrides {
            prerelease_requested: args.prerelease,
            prerelease_token: args.prerelease_token,
        },
        dry_run: args.dry_run,
    };

    let env: HashMap<String, String> = std::env::vars().collect();
    let result = orchestration::run_release_workflow(&workflow_args, &config, &env)?;

    ui::display_ci_context(&result.ci);
    for note in &result.notes {
        ui::display_boundary_warning(note);
    }
    ui::display_release(result.release.as_ref(), args.dry_run);
    ui::display_publish_verdict(&result.publish);

    if let Some(path) = args.summary {
        orchestration::write_summary(&result, &path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        ui::display_status(&format!("Summary written to {}", path.display()));
    }

    Ok(())
}
