use crate::ci::CiContext;
use crate::resolver::ReleaseDecision;
use serde::Serialize;
use std::fmt;

/// Why a package publication is suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRelease,
    NotOnCi,
    PullRequest,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoRelease => write!(f, "no release was created"),
            SkipReason::NotOnCi => write!(f, "not running on a known CI system"),
            SkipReason::PullRequest => write!(f, "pull request builds never publish"),
        }
    }
}

/// Publication verdict for downstream steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PublishVerdict {
    Publish { version: String },
    Skip { reason: SkipReason },
}

impl PublishVerdict {
    pub fn should_publish(&self) -> bool {
        matches!(self, PublishVerdict::Publish { .. })
    }
}

/// Publication requires a release, a known CI system and a non-PR build.
pub struct PublishGate;

impl PublishGate {
    pub fn evaluate(ci: &CiContext, release: Option<&ReleaseDecision>) -> PublishVerdict {
        let verdict = match release {
            None => PublishVerdict::Skip {
                reason: SkipReason::NoRelease,
            },
            Some(_) if !ci.is_ci() => PublishVerdict::Skip {
                reason: SkipReason::NotOnCi,
            },
            Some(_) if ci.is_pull_request => PublishVerdict::Skip {
                reason: SkipReason::PullRequest,
            },
            Some(decision) => PublishVerdict::Publish {
                version: decision.version.to_string(),
            },
        };
        tracing::debug!(?verdict, ci = %ci.ci_system, "evaluated publish gate");
        verdict
    }
}
