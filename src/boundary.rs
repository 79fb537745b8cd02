use std::fmt;

/// Non-fatal conditions met while resolving a release.
/// They are logged and reported, never raised as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The repository has no commits yet
    EmptyRepository,
    /// No new commits since the latest tag
    NoNewCommits {
        latest_tag: String,
        current_commit_hash: String,
    },
    /// Tag exists but cannot be parsed as a release version
    UnparsableTag { tag: String, reason: String },
    /// Matched rule does not allow full releases and no prerelease was requested
    BranchNotReleasable { branch: String, rule: String },
    /// A prerelease was requested on a branch whose rule does not allow one
    PrereleaseNotAllowed { branch: String, rule: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::EmptyRepository => write!(f, "Repository has no commits"),
            BoundaryWarning::NoNewCommits {
                latest_tag,
                current_commit_hash,
            } => {
                let short_hash = if current_commit_hash.len() > 7 {
                    &current_commit_hash[..7]
                } else {
                    current_commit_hash.as_str()
                };
                write!(
                    f,
                    "No new commits since tag '{}' (current: {})",
                    latest_tag, short_hash
                )
            }
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            BoundaryWarning::BranchNotReleasable { branch, rule } => {
                write!(
                    f,
                    "Branch '{}' (rule '{}') does not produce full releases",
                    branch, rule
                )
            }
            BoundaryWarning::PrereleaseNotAllowed { branch, rule } => {
                write!(
                    f,
                    "Prerelease requested but rule '{}' for branch '{}' does not allow one",
                    rule, branch
                )
            }
        }
    }
}
