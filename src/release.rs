//! Release commit creation.
//!
//! The builder is the only place that mutates the repository. It writes the
//! version file, commits, tags and optionally pushes, in that order, at most
//! once per decision. Anything failing after the commit exists leaves a
//! half-applied release and is reported as [`ReleaseError::PartialRelease`].

use crate::config::ReleaseConfig;
use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::git::{Author, Repository};
use crate::resolver::ReleaseDecision;
use crate::version_file;
use std::path::{Path, PathBuf};

/// How the release commit is produced
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOptions {
    pub version_file: Option<PathBuf>,
    pub version_key: String,
    pub commit_message: String,
    pub push: bool,
    pub remote: String,
    pub author: Author,
    pub dry_run: bool,
}

impl ReleaseOptions {
    pub fn from_config(config: &ReleaseConfig, dry_run: bool) -> Self {
        ReleaseOptions {
            version_file: config.version_file.clone(),
            version_key: config.version_key.clone(),
            commit_message: config.commit_message.clone(),
            push: config.push,
            remote: config.remote.clone(),
            author: Author {
                name: config.author_name.clone(),
                email: config.author_email.clone(),
            },
            dry_run,
        }
    }

    pub fn commit_message_for(&self, version: &Version) -> String {
        self.commit_message
            .replace("{version}", &version.to_string())
    }
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self::from_config(&ReleaseConfig::default(), false)
    }
}

/// Turns a release decision into a commit and tag
pub struct ReleaseCommitBuilder<'a, R: Repository> {
    repo: &'a R,
    options: ReleaseOptions,
}

impl<'a, R: Repository> ReleaseCommitBuilder<'a, R> {
    pub fn new(repo: &'a R, options: ReleaseOptions) -> Self {
        ReleaseCommitBuilder { repo, options }
    }

    /// Apply `decision`. Without a decision nothing is touched.
    ///
    /// Returns the applied decision as confirmation.
    pub fn build(&self, decision: Option<ReleaseDecision>) -> Result<Option<ReleaseDecision>> {
        let Some(decision) = decision else {
            tracing::debug!("no release decision, repository left untouched");
            return Ok(None);
        };

        let version = &decision.version;
        let tag = version.as_tag();
        if self.repo.find_tag_oid(&tag)?.is_some() {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", tag)));
        }

        if self.options.dry_run {
            tracing::info!(%tag, "dry run, skipping release commit");
            return Ok(Some(decision));
        }

        let version_path = self.write_version_file(version)?;
        let paths: Vec<&Path> = version_path.iter().map(PathBuf::as_path).collect();

        let message = self.options.commit_message_for(version);
        let oid = self
            .repo
            .commit_paths(&paths, &message, &self.options.author)
            .map_err(|e| {
                if version_path.is_some() {
                    ReleaseError::partial(version.to_string(), "committing", e)
                } else {
                    e
                }
            })?;
        tracing::info!(commit = %oid, %message, "created release commit");

        self.repo
            .create_tag(&tag, oid)
            .map_err(|e| ReleaseError::partial(version.to_string(), "creating tag", e))?;
        tracing::info!(%tag, "created release tag");

        if self.options.push {
            self.push(&tag)
                .map_err(|e| ReleaseError::partial(version.to_string(), "pushing", e))?;
        }

        Ok(Some(decision))
    }

    /// Write the new version, returning the path relative to the working tree
    fn write_version_file(&self, version: &Version) -> Result<Option<PathBuf>> {
        let Some(relative) = &self.options.version_file else {
            return Ok(None);
        };
        let absolute = self.repo.workdir()?.join(relative);
        if !absolute.is_file() {
            return Err(ReleaseError::config(format!(
                "Version file {} does not exist",
                absolute.display()
            )));
        }

        let current = version_file::read_version(&absolute, &self.options.version_key)?;
        version_file::write_version(&absolute, &self.options.version_key, version)?;
        tracing::debug!(
            file = %relative.display(),
            from = %current,
            to = %version,
            "updated version file"
        );
        Ok(Some(relative.clone()))
    }

    fn push(&self, tag: &str) -> Result<()> {
        let mut refspecs = Vec::new();
        match self.repo.head_branch()? {
            Some(branch) => refspecs.push(format!("refs/heads/{0}:refs/heads/{0}", branch)),
            None => tracing::warn!("HEAD is detached, pushing the tag only"),
        }
        refspecs.push(format!("refs/tags/{0}:refs/tags/{0}", tag));

        self.repo.push_refs(&self.options.remote, &refspecs)?;
        tracing::info!(remote = %self.options.remote, %tag, "pushed release");
        Ok(())
    }
}
