//! Release workflow orchestration
//!
//! One invocation: detect the CI context once, resolve the next version,
//! build the release commit and evaluate the publish gate. Results are
//! passed along as typed values; nothing here reads the process
//! environment.

use crate::boundary::BoundaryWarning;
use crate::ci::CiContext;
use crate::config::{Config, ReleaseOverrides};
use crate::error::{ReleaseError, Result};
use crate::git::{Git2Repository, Repository};
use crate::publish::{PublishGate, PublishVerdict};
use crate::release::{ReleaseCommitBuilder, ReleaseOptions};
use crate::resolver::{ReleaseDecision, ReleaseVersionResolver, RepositoryState};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the release workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseWorkflowArgs {
    /// Any path inside the repository
    pub repo_path: PathBuf,

    /// Branch to release from; CI and HEAD are consulted when absent
    pub branch: Option<String>,

    pub overrides: ReleaseOverrides,

    /// Resolve and report without touching the repository
    pub dry_run: bool,
}

/// Typed result record of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowResult {
    pub branch: String,
    pub ci: CiContext,
    pub release: Option<ReleaseDecision>,
    pub publish: PublishVerdict,
    #[serde(skip)]
    pub notes: Vec<BoundaryWarning>,
}

/// Run the workflow against the repository at `args.repo_path`.
///
/// `env` is the environment snapshot used for CI detection.
pub fn run_release_workflow(
    args: &ReleaseWorkflowArgs,
    config: &Config,
    env: &HashMap<String, String>,
) -> Result<WorkflowResult> {
    let ci = CiContext::detect(env);
    tracing::info!(ci = %ci.ci_system, pull_request = ci.is_pull_request, "detected CI context");

    let repo = Git2Repository::open(&args.repo_path)?;
    run_with_repository(&repo, args, config, ci)
}

/// Run the workflow against an already opened repository
pub fn run_with_repository<R: Repository>(
    repo: &R,
    args: &ReleaseWorkflowArgs,
    config: &Config,
    ci: CiContext,
) -> Result<WorkflowResult> {
    let branch = select_branch(args.branch.as_deref(), &ci, repo)?;

    let history = repo.history()?;
    let state = RepositoryState::from_history(&history);
    let resolver =
        ReleaseVersionResolver::new(config.branch_policy()?, config.conventional_commits.clone());
    let resolution = resolver.resolve(&state, &branch, &args.overrides)?;
    for note in &resolution.notes {
        tracing::info!("{}", note);
    }

    let builder =
        ReleaseCommitBuilder::new(repo, ReleaseOptions::from_config(&config.release, args.dry_run));
    let release = builder.build(resolution.decision)?;
    let publish = PublishGate::evaluate(&ci, release.as_ref());

    Ok(WorkflowResult {
        branch,
        ci,
        release,
        publish,
        notes: resolution.notes,
    })
}

/// Explicit branch, then the CI branch, then the checked-out branch
fn select_branch<R: Repository>(
    explicit: Option<&str>,
    ci: &CiContext,
    repo: &R,
) -> Result<String> {
    if let Some(branch) = explicit.or(ci.current_branch.as_deref()) {
        return Ok(branch.to_string());
    }
    repo.head_branch()?.ok_or_else(|| {
        ReleaseError::config("Cannot determine current branch: HEAD is detached, pass --branch")
    })
}

/// Write the result record as TOML for downstream steps
pub fn write_summary(result: &WorkflowResult, path: &Path) -> Result<()> {
    fs::write(path, toml::to_string(result)?)?;
    Ok(())
}
