//! Git operations abstraction layer
//!
//! The release logic depends on the [Repository] trait rather than on
//! `git2` directly:
//!
//! - [repository::Git2Repository]: real implementation using the `git2` crate
//! - [mock::MockRepository]: in-memory implementation for tests
//!
//! ```no_run
//! # use ci_release::git::{Git2Repository, Repository};
//! # fn example() -> ci_release::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! for commit in repo.history()? {
//!     println!("{} {:?}", commit.message, commit.tags);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::{Path, PathBuf};

/// Commit information for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
    /// Names of the tags pointing at this commit
    pub tags: Vec<String>,
    /// Hashes of the parent commits, first parent first
    pub parents: Vec<String>,
}

/// Identity used for release commits when git has none configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Repository operations needed to resolve and record a release.
///
/// The repository is assumed to be owned by the current process for the
/// duration of one invocation.
pub trait Repository {
    /// Name of the checked-out branch, `None` when HEAD is detached
    fn head_branch(&self) -> Result<Option<String>>;

    /// Commits reachable from HEAD, newest first, each with its tags and
    /// parents. Empty for a repository without commits.
    fn history(&self) -> Result<Vec<CommitInfo>>;

    /// Root of the working tree
    fn workdir(&self) -> Result<PathBuf>;

    /// Commit `paths` (relative to the working tree) on top of HEAD.
    ///
    /// The new tree is HEAD's tree with only `paths` replaced; anything
    /// else staged in the index stays out of the commit.
    fn commit_paths(&self, paths: &[&Path], message: &str, author: &Author) -> Result<Oid>;

    /// Find a tag by name and get the commit it points at
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Create a lightweight tag at given OID
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Push refspecs such as `refs/tags/v1.0.0` to a remote
    fn push_refs(&self, remote: &str, refspecs: &[String]) -> Result<()>;
}
