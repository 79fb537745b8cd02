//! Next-version resolution.
//!
//! [`RepositoryState`] condenses the history reachable from HEAD into the
//! facts the resolver needs; [`ReleaseVersionResolver`] turns those facts,
//! the branch policy and the caller's overrides into at most one
//! [`ReleaseDecision`]. Both are pure.

use crate::boundary::BoundaryWarning;
use crate::config::{ConventionalCommitsConfig, ReleaseOverrides};
use crate::domain::{determine_bump, BranchPolicy, Version};
use crate::error::Result;
use crate::git::CommitInfo;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// A release commit should be produced for `version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDecision {
    pub version: Version,
    pub previous_version: Option<Version>,
}

/// Outcome of one resolution: zero or one decision plus what was noticed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub decision: Option<ReleaseDecision>,
    pub notes: Vec<BoundaryWarning>,
}

/// Tag and commit facts reachable from HEAD
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryState {
    /// Every parseable version tag reachable from HEAD
    pub tags: Vec<Version>,
    /// Messages of commits after the nearest full-release tag, newest first
    pub commits_since_release: Vec<String>,
    /// Commits after the nearest version tag of any kind
    pub commits_since_tag: usize,
    pub total_commits: usize,
    pub head: Option<String>,
    pub notes: Vec<BoundaryWarning>,
}

impl RepositoryState {
    /// Condense a HEAD-first history. Malformed tags are skipped.
    ///
    /// "Since a tag" means not reachable from the tagged commit, so commits
    /// merged in from older side branches still count.
    pub fn from_history(history: &[CommitInfo]) -> Self {
        let mut state = RepositoryState {
            total_commits: history.len(),
            head: history.first().map(|commit| commit.hash.clone()),
            ..RepositoryState::default()
        };
        let mut tagged = Vec::new();
        let mut released = Vec::new();

        for commit in history {
            let versions: Vec<Version> = commit
                .tags
                .iter()
                .filter_map(|tag| match Version::from_tag(tag) {
                    Ok(version) => Some(version),
                    Err(e) => {
                        tracing::warn!(tag = %tag, error = %e, "ignoring unparsable tag");
                        state.notes.push(BoundaryWarning::UnparsableTag {
                            tag: tag.clone(),
                            reason: e.to_string(),
                        });
                        None
                    }
                })
                .collect();

            if !versions.is_empty() {
                tagged.push(commit.hash.as_str());
            }
            if versions.iter().any(|v| !v.is_prerelease()) {
                released.push(commit.hash.as_str());
            }
            state.tags.extend(versions);
        }

        let parents: HashMap<&str, &[String]> = history
            .iter()
            .map(|commit| (commit.hash.as_str(), commit.parents.as_slice()))
            .collect();
        let before_tag = ancestors(&parents, tagged);
        let before_release = ancestors(&parents, released);

        state.commits_since_tag = history
            .iter()
            .filter(|commit| !before_tag.contains(commit.hash.as_str()))
            .count();
        state.commits_since_release = history
            .iter()
            .filter(|commit| !before_release.contains(commit.hash.as_str()))
            .map(|commit| commit.message.clone())
            .collect();

        state
    }

    /// Highest reachable version tag
    pub fn baseline(&self) -> Option<&Version> {
        self.tags.iter().max()
    }

    /// Highest reachable full release
    pub fn last_release(&self) -> Option<&Version> {
        self.tags.iter().filter(|v| !v.is_prerelease()).max()
    }

    /// Highest existing prerelease of `release` with `token`
    pub fn latest_in_train(&self, release: &Version, token: &str) -> Option<&Version> {
        self.tags
            .iter()
            .filter(|v| v.same_release(release))
            .filter(|v| v.prerelease.as_ref().is_some_and(|p| p.token == token))
            .max()
    }
}

/// `roots` and every commit reachable from them through `parents`
fn ancestors<'a>(
    parents: &HashMap<&'a str, &'a [String]>,
    roots: Vec<&'a str>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut stack = roots;
    while let Some(hash) = stack.pop() {
        if !seen.insert(hash) {
            continue;
        }
        if let Some(&commit_parents) = parents.get(hash) {
            stack.extend(commit_parents.iter().map(String::as_str));
        }
    }
    seen
}

/// Computes the next version from repository state and branch policy
#[derive(Debug, Clone)]
pub struct ReleaseVersionResolver {
    policy: BranchPolicy,
    commits: ConventionalCommitsConfig,
}

impl ReleaseVersionResolver {
    pub fn new(policy: BranchPolicy, commits: ConventionalCommitsConfig) -> Self {
        ReleaseVersionResolver { policy, commits }
    }

    /// Resolve the release for `branch`.
    ///
    /// Fails when no branch rule matches or when the next version does not
    /// fit in `u64`. Every other reason not to release yields a resolution
    /// without decision.
    pub fn resolve(
        &self,
        state: &RepositoryState,
        branch: &str,
        overrides: &ReleaseOverrides,
    ) -> Result<Resolution> {
        let policy = match overrides.prerelease_token.as_deref() {
            Some(token) => Cow::Owned(self.policy.with_prerelease_token(token)?),
            None => Cow::Borrowed(&self.policy),
        };
        let rule = policy.select(branch)?;
        tracing::debug!(branch, rule = %rule.name, "matched branch rule");

        let mut resolution = Resolution {
            decision: None,
            notes: state.notes.clone(),
        };

        if state.total_commits == 0 {
            resolution.notes.push(BoundaryWarning::EmptyRepository);
            return Ok(resolution);
        }

        let baseline = state.baseline().cloned();
        let prerelease = overrides.prerelease_requested && rule.allows_prerelease();
        if overrides.prerelease_requested && !prerelease {
            resolution.notes.push(BoundaryWarning::PrereleaseNotAllowed {
                branch: branch.to_string(),
                rule: rule.name.clone(),
            });
        }

        let no_new_commits = if prerelease {
            baseline.is_some() && state.commits_since_tag == 0
        } else {
            state.last_release().is_some() && state.commits_since_release.is_empty()
        };
        if no_new_commits {
            resolution.notes.push(BoundaryWarning::NoNewCommits {
                latest_tag: baseline.as_ref().map(Version::as_tag).unwrap_or_default(),
                current_commit_hash: state.head.clone().unwrap_or_default(),
            });
            return Ok(resolution);
        }

        if !prerelease && !rule.is_release_branch {
            resolution.notes.push(BoundaryWarning::BranchNotReleasable {
                branch: branch.to_string(),
                rule: rule.name.clone(),
            });
            return Ok(resolution);
        }

        let candidate = match state.last_release() {
            Some(release) => {
                let bump = determine_bump(&state.commits_since_release, &self.commits);
                tracing::debug!(%bump, commits = state.commits_since_release.len(), "classified commits");
                release.bump(bump)?
            }
            None => Version::INITIAL,
        };

        let version = if prerelease {
            // A running train on a higher release is continued, not undercut.
            let target = match &baseline {
                Some(b) if b.is_prerelease() && b.release() > candidate => b.release(),
                _ => candidate,
            };
            let token = rule.prerelease_token.as_str();
            let number = match state
                .latest_in_train(&target, token)
                .and_then(|v| v.prerelease.as_ref())
            {
                Some(latest) => latest.next()?.number,
                None => 1,
            };
            target.with_prerelease(token, number)
        } else {
            candidate
        };

        let previous = baseline
            .as_ref()
            .map(Version::as_tag)
            .unwrap_or_else(|| "none".to_string());
        tracing::info!(version = %version.as_tag(), %previous, "resolved next release");
        resolution.decision = Some(ReleaseDecision {
            version,
            previous_version: baseline,
        });
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BranchRule;
    use crate::error::ReleaseError;

    fn commit(message: &str, tags: &[&str]) -> CommitInfo {
        CommitInfo {
            hash: String::new(),
            message: message.to_string(),
            author: "test".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            parents: Vec::new(),
        }
    }

    /// Link a newest-first list into a single-parent chain
    fn linear(history: &[CommitInfo]) -> Vec<CommitInfo> {
        let hash = |i: usize| format!("{:040x}", history.len() - i);
        history
            .iter()
            .enumerate()
            .map(|(i, c)| CommitInfo {
                hash: hash(i),
                parents: if i + 1 < history.len() {
                    vec![hash(i + 1)]
                } else {
                    Vec::new()
                },
                ..c.clone()
            })
            .collect()
    }

    fn with_parents(mut commit: CommitInfo, hash: &str, parents: &[&str]) -> CommitInfo {
        commit.hash = hash.to_string();
        commit.parents = parents.iter().map(|p| p.to_string()).collect();
        commit
    }

    /// `main`: init <- fix (tagged) <- merge; `side`: init <- feat, older
    /// than the tagged commit, so listed after it
    fn merged_side_branch(tag: &str) -> Vec<CommitInfo> {
        vec![
            with_parents(commit("Merge branch 'side'", &[]), "d", &["b", "c"]),
            with_parents(commit("fix: on main", &[tag]), "b", &["a"]),
            with_parents(commit("feat: side feature", &[]), "c", &["a"]),
            with_parents(commit("chore: init", &[]), "a", &[]),
        ]
    }

    fn resolver() -> ReleaseVersionResolver {
        let policy = BranchPolicy::from_rules(vec![
            BranchRule::new("main", "main$"),
            BranchRule::new("develop", "develop$").prerelease(""),
            BranchRule::new("feature", "feature/")
                .release_branch(false)
                .prerelease("rc"),
        ])
        .unwrap();
        ReleaseVersionResolver::new(policy, ConventionalCommitsConfig::default())
    }

    fn release() -> ReleaseOverrides {
        ReleaseOverrides::default()
    }

    fn prerelease(token: Option<&str>) -> ReleaseOverrides {
        ReleaseOverrides {
            prerelease_requested: true,
            prerelease_token: token.map(str::to_string),
        }
    }

    fn resolve(history: &[CommitInfo], branch: &str, overrides: &ReleaseOverrides) -> Resolution {
        resolver()
            .resolve(&RepositoryState::from_history(&linear(history)), branch, overrides)
            .unwrap()
    }

    fn tag_of(resolution: &Resolution) -> Option<(String, Option<String>)> {
        resolution.decision.as_ref().map(|d| {
            (
                d.version.as_tag(),
                d.previous_version.as_ref().map(Version::as_tag),
            )
        })
    }

    #[test]
    fn test_state_counts() {
        let history = vec![
            commit("fix: c", &[]),
            commit("feat: b", &["v0.2.0-rc.1"]),
            commit("chore: a", &["v0.1.0", "latest"]),
            commit("chore: init", &[]),
        ];
        let state = RepositoryState::from_history(&linear(&history));
        assert_eq!(state.total_commits, 4);
        assert_eq!(state.commits_since_tag, 1);
        assert_eq!(state.commits_since_release, vec!["fix: c", "feat: b"]);
        assert_eq!(state.baseline(), Some(&Version::new(0, 2, 0).with_prerelease("rc", 1)));
        assert_eq!(state.last_release(), Some(&Version::new(0, 1, 0)));
        assert!(matches!(
            state.notes.as_slice(),
            [BoundaryWarning::UnparsableTag { tag, .. }] if tag == "latest"
        ));
    }

    #[test]
    fn test_merged_commits_older_than_tag_count_since_release() {
        let state = RepositoryState::from_history(&merged_side_branch("v0.1.0"));
        assert_eq!(
            state.commits_since_release,
            vec!["Merge branch 'side'", "feat: side feature"]
        );
        assert_eq!(state.commits_since_tag, 2);

        let resolution = resolver().resolve(&state, "main", &release()).unwrap();
        assert_eq!(
            tag_of(&resolution),
            Some(("v0.2.0".to_string(), Some("v0.1.0".to_string())))
        );
    }

    #[test]
    fn test_merged_commits_count_since_prerelease_tag() {
        let mut history = merged_side_branch("v0.2.0-rc.1");
        history[3].tags.push("v0.1.0".to_string());
        let state = RepositoryState::from_history(&history);
        assert_eq!(state.commits_since_tag, 2);
        assert_eq!(state.commits_since_release.len(), 3);

        let resolution = resolver()
            .resolve(&state, "feature/x", &prerelease(None))
            .unwrap();
        assert_eq!(tag_of(&resolution).unwrap().0, "v0.2.0-rc.2");
    }

    #[test]
    fn test_version_overflow_is_error_not_panic() {
        let history = linear(&[
            commit("fix: x", &[]),
            commit("release", &["v1.2.18446744073709551615"]),
        ]);
        let err = resolver()
            .resolve(&RepositoryState::from_history(&history), "main", &release())
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));

        let history = linear(&[
            commit("fix: x", &[]),
            commit("release", &["v0.2.0-rc.18446744073709551615"]),
            commit("init", &["v0.1.0"]),
        ]);
        let err = resolver()
            .resolve(&RepositoryState::from_history(&history), "feature/x", &prerelease(None))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));
    }

    #[test]
    fn test_empty_repository_yields_nothing() {
        let resolution = resolve(&[], "main", &release());
        assert_eq!(resolution.decision, None);
        assert_eq!(resolution.notes, vec![BoundaryWarning::EmptyRepository]);
    }

    #[test]
    fn test_first_release_is_initial_version() {
        let resolution = resolve(&[commit("chore: initial commit", &[])], "main", &release());
        assert_eq!(tag_of(&resolution), Some(("v0.0.0".to_string(), None)));
    }

    #[test]
    fn test_feature_after_initial_release() {
        let history = vec![
            commit("feat: some new feature", &[]),
            commit("chore(release): v0.0.0", &["v0.0.0"]),
            commit("chore: initial commit", &[]),
        ];
        let resolution = resolve(&history, "main", &release());
        assert_eq!(
            tag_of(&resolution),
            Some(("v0.1.0".to_string(), Some("v0.0.0".to_string())))
        );
    }

    #[test]
    fn test_no_commits_since_release_is_idempotent() {
        let history = vec![
            commit("chore(release): v0.1.0", &["v0.1.0"]),
            commit("feat: x", &[]),
        ];
        let resolution = resolve(&history, "main", &release());
        assert_eq!(resolution.decision, None);
        assert!(matches!(
            resolution.notes.as_slice(),
            [BoundaryWarning::NoNewCommits { latest_tag, .. }] if latest_tag == "v0.1.0"
        ));
    }

    #[test]
    fn test_bump_classes() {
        for (message, expected) in [
            ("fix: bug", "v1.2.4"),
            ("chore: tidy", "v1.2.4"),
            ("feat: thing", "v1.3.0"),
            ("feat!: break", "v2.0.0"),
            ("fix: x\n\nBREAKING CHANGE: y", "v2.0.0"),
        ] {
            let history = vec![commit(message, &[]), commit("release", &["v1.2.3"])];
            let resolution = resolve(&history, "main", &release());
            assert_eq!(tag_of(&resolution).unwrap().0, expected, "for {:?}", message);
        }
    }

    #[test]
    fn test_candidate_tag_superseded_by_full_release() {
        let history = vec![
            commit("feat: some new feature", &["v0.3.0-rc.1"]),
            commit("chore: initial commit", &["v0.1.0"]),
        ];
        let resolution = resolve(&history, "main", &release());
        assert_eq!(
            tag_of(&resolution),
            Some(("v0.2.0".to_string(), Some("v0.3.0-rc.1".to_string())))
        );
    }

    #[test]
    fn test_prerelease_train_starts_and_continues() {
        let mut history = vec![
            commit("feat: some new feature", &[]),
            commit("chore: initial commit", &["v0.1.0"]),
        ];
        let overrides = prerelease(Some("rc1.dev"));

        let first = resolve(&history, "feature/x", &overrides);
        assert_eq!(
            tag_of(&first),
            Some(("v0.2.0-rc1.dev.1".to_string(), Some("v0.1.0".to_string())))
        );

        history.insert(0, commit("chore(release): v0.2.0-rc1.dev.1", &["v0.2.0-rc1.dev.1"]));
        let again = resolve(&history, "feature/x", &overrides);
        assert_eq!(again.decision, None);

        history.insert(0, commit("fix: follow-up", &[]));
        let second = resolve(&history, "feature/x", &overrides);
        assert_eq!(
            tag_of(&second),
            Some((
                "v0.2.0-rc1.dev.2".to_string(),
                Some("v0.2.0-rc1.dev.1".to_string())
            ))
        );
    }

    #[test]
    fn test_changing_token_starts_new_train() {
        let history = vec![
            commit("fix: more", &[]),
            commit("release", &["v0.2.0-rc.3"]),
            commit("feat: a", &[]),
            commit("init", &["v0.1.0"]),
        ];
        let resolution = resolve(&history, "feature/x", &prerelease(Some("beta")));
        assert_eq!(tag_of(&resolution).unwrap().0, "v0.2.0-beta.1");
    }

    #[test]
    fn test_bumping_past_train_starts_new_train() {
        let history = vec![
            commit("feat!: breaking", &[]),
            commit("release", &["v0.2.0-rc.3"]),
            commit("feat: a", &[]),
            commit("init", &["v0.1.0"]),
        ];
        let resolution = resolve(&history, "feature/x", &prerelease(None));
        assert_eq!(tag_of(&resolution).unwrap().0, "v1.0.0-rc.1");
    }

    #[test]
    fn test_prerelease_never_undercuts_running_train() {
        let history = vec![
            commit("fix: more", &[]),
            commit("feat: b", &["v0.3.0-rc.1"]),
            commit("init", &["v0.1.0"]),
        ];
        let resolution = resolve(&history, "feature/x", &prerelease(None));
        assert_eq!(tag_of(&resolution).unwrap().0, "v0.3.0-rc.2");
    }

    #[test]
    fn test_prerelease_needs_explicit_request() {
        let history = vec![commit("feat: a", &[]), commit("init", &["v0.1.0"])];
        let resolution = resolve(&history, "feature/x", &release());
        assert_eq!(resolution.decision, None);
        assert!(matches!(
            resolution.notes.as_slice(),
            [BoundaryWarning::BranchNotReleasable { rule, .. }] if rule == "feature"
        ));
    }

    #[test]
    fn test_token_override_leaves_disabled_rules_alone() {
        let history = vec![commit("feat: a", &[]), commit("init", &["v0.1.0"])];
        let overrides = prerelease(Some("alpha"));

        let develop = resolve(&history, "develop", &overrides);
        assert_eq!(tag_of(&develop).unwrap().0, "v0.2.0");
        assert!(develop
            .notes
            .iter()
            .any(|n| matches!(n, BoundaryWarning::PrereleaseNotAllowed { .. })));

        let feature = resolve(&history, "feature/y", &overrides);
        assert_eq!(tag_of(&feature).unwrap().0, "v0.2.0-alpha.1");
    }

    #[test]
    fn test_unmatched_branch_is_error() {
        let state = RepositoryState::from_history(&[commit("feat: a", &[])]);
        let err = resolver()
            .resolve(&state, "hotfix/1", &release())
            .unwrap_err();
        assert!(matches!(err, ReleaseError::NoMatchingBranch { .. }));
    }

    #[test]
    fn test_malformed_tags_do_not_abort() {
        let history = vec![
            commit("fix: a", &["nightly", "v1.2"]),
            commit("init", &["v1.0.0"]),
        ];
        let resolution = resolve(&history, "main", &release());
        assert_eq!(tag_of(&resolution).unwrap().0, "v1.0.1");
        assert_eq!(resolution.notes.len(), 2);
    }

    #[test]
    fn test_successive_releases_are_monotonic() {
        let mut history = vec![commit("init", &[])];
        let mut previous = resolve(&history, "main", &release()).decision.unwrap();
        history.insert(0, commit("release", &[previous.version.as_tag().as_str()]));

        for message in ["fix: a", "feat: b", "fix: c", "feat!: d"] {
            history.insert(0, commit(message, &[]));
            let decision = resolve(&history, "main", &release()).decision.unwrap();
            assert!(decision.version > previous.version);
            assert_eq!(decision.previous_version.as_ref(), Some(&previous.version));
            history.insert(0, commit("release", &[decision.version.as_tag().as_str()]));
            previous = decision;
        }
        assert_eq!(previous.version.as_tag(), "v1.0.0");
    }
}
