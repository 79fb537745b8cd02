//! CI environment detection.
//!
//! The environment is read once into a snapshot and classified into an
//! immutable [`CiContext`]; nothing downstream reads process variables again.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// CI system the process runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CiSystem {
    Jenkins,
    GithubActions,
    Unknown,
}

impl fmt::Display for CiSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CiSystem::Jenkins => write!(f, "Jenkins"),
            CiSystem::GithubActions => write!(f, "GitHub Actions"),
            CiSystem::Unknown => write!(f, "unknown"),
        }
    }
}

/// CI identity plus pull-request and branch facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CiContext {
    pub ci_system: CiSystem,
    pub is_pull_request: bool,
    pub target_branch: Option<String>,
    pub current_branch: Option<String>,
}

impl CiContext {
    /// Context used when no CI system is recognised
    pub fn unknown() -> Self {
        CiContext {
            ci_system: CiSystem::Unknown,
            is_pull_request: false,
            target_branch: None,
            current_branch: None,
        }
    }

    /// Classify an environment snapshot.
    ///
    /// Jenkins is checked before GitHub Actions. Empty values count as unset.
    /// Jenkins push builds carry no branch facts.
    pub fn detect(env: &HashMap<String, String>) -> Self {
        let var = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        if var("JENKINS_HOME").is_some() {
            let is_pull_request = var("CHANGE_ID").is_some();
            let (target_branch, current_branch) = if is_pull_request {
                (var("CHANGE_TARGET"), var("CHANGE_BRANCH"))
            } else {
                (None, None)
            };
            return CiContext {
                ci_system: CiSystem::Jenkins,
                is_pull_request,
                target_branch,
                current_branch,
            };
        }

        if var("GITHUB_ACTIONS").as_deref() == Some("true") {
            let is_pull_request = var("GITHUB_EVENT_NAME").as_deref() == Some("pull_request");
            let (target_branch, current_branch) = if is_pull_request {
                (var("GITHUB_BASE_REF"), var("GITHUB_HEAD_REF"))
            } else {
                let ref_name = var("GITHUB_REF_NAME");
                (ref_name.clone(), ref_name)
            };
            return CiContext {
                ci_system: CiSystem::GithubActions,
                is_pull_request,
                target_branch,
                current_branch,
            };
        }

        CiContext::unknown()
    }

    /// Snapshot the process environment and classify it
    pub fn from_process_env() -> Self {
        Self::detect(&std::env::vars().collect())
    }

    pub fn is_ci(&self) -> bool {
        self.ci_system != CiSystem::Unknown
    }
}
