use crate::error::{ReleaseError, Result};
use crate::git::{Author, CommitInfo, Repository};
use git2::{ObjectType, Oid};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// In-memory repository for testing without actual git operations.
///
/// History is linear; commits are stored newest first.
pub struct MockRepository {
    branch: Option<String>,
    workdir: PathBuf,
    commits: RefCell<Vec<CommitInfo>>,
    pushed: RefCell<Vec<String>>,
    fail_tagging: bool,
}

impl MockRepository {
    /// Create a new empty mock repository on `branch`
    pub fn new(branch: impl Into<String>) -> Self {
        MockRepository {
            branch: Some(branch.into()),
            workdir: PathBuf::from("/mock/repo"),
            commits: RefCell::new(Vec::new()),
            pushed: RefCell::new(Vec::new()),
            fail_tagging: false,
        }
    }

    /// Use a real directory as working tree (for version files)
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Make every `create_tag` call fail
    pub fn failing_tags(mut self) -> Self {
        self.fail_tagging = true;
        self
    }

    /// Detach HEAD
    pub fn detached(mut self) -> Self {
        self.branch = None;
        self
    }

    /// Add a commit on top of HEAD
    pub fn add_commit(&self, message: &str) -> Oid {
        let mut commits = self.commits.borrow_mut();
        let seed = format!("{}\n{}", commits.len(), message);
        let oid = Oid::hash_object(ObjectType::Commit, seed.as_bytes())
            .unwrap_or_else(|_| Oid::zero());
        let parents = commits.first().map(|head| head.hash.clone()).into_iter().collect();
        commits.insert(
            0,
            CommitInfo {
                hash: oid.to_string(),
                message: message.to_string(),
                author: "mock".to_string(),
                tags: Vec::new(),
                parents,
            },
        );
        oid
    }

    /// Tag the current HEAD commit
    pub fn add_tag(&self, name: &str) {
        if let Some(head) = self.commits.borrow_mut().first_mut() {
            head.tags.push(name.to_string());
        }
    }

    /// Refspecs pushed so far
    pub fn pushed(&self) -> Vec<String> {
        self.pushed.borrow().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }
}

impl Repository for MockRepository {
    fn head_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn history(&self) -> Result<Vec<CommitInfo>> {
        Ok(self.commits.borrow().clone())
    }

    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn commit_paths(&self, _paths: &[&Path], message: &str, _author: &Author) -> Result<Oid> {
        Ok(self.add_commit(message))
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        self.commits
            .borrow()
            .iter()
            .find(|commit| commit.tags.iter().any(|tag| tag == tag_name))
            .map(|commit| Oid::from_str(&commit.hash))
            .transpose()
            .map_err(ReleaseError::from)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        if self.fail_tagging {
            return Err(ReleaseError::tag("Cannot create tag: mock failure"));
        }
        if self.find_tag_oid(name)?.is_some() {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", name)));
        }
        let hash = oid.to_string();
        let mut commits = self.commits.borrow_mut();
        let commit = commits
            .iter_mut()
            .find(|commit| commit.hash == hash)
            .ok_or_else(|| ReleaseError::tag(format!("Cannot find object: {}", hash)))?;
        commit.tags.push(name.to_string());
        Ok(())
    }

    fn push_refs(&self, _remote: &str, refspecs: &[String]) -> Result<()> {
        self.pushed.borrow_mut().extend(refspecs.iter().cloned());
        Ok(())
    }
}
