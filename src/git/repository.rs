use crate::error::{ReleaseError, Result};
use crate::git::{Author, CommitInfo};
use git2::build::TreeUpdateBuilder;
use git2::{ErrorCode, FileMode, Oid, Repository as Git2Repo, Signature, Sort, Tree};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Map of commit OID to the tag names pointing at it
    fn tags_by_commit(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut map: HashMap<Oid, Vec<String>> = HashMap::new();
        let names = self.repo.tag_names(None)?;

        for name in names.iter().flatten() {
            let commit = self
                .repo
                .find_reference(&format!("refs/tags/{}", name))
                .and_then(|reference| reference.peel_to_commit());
            match commit {
                Ok(commit) => map.entry(commit.id()).or_default().push(name.to_string()),
                Err(e) => tracing::debug!(tag = name, error = %e, "tag does not point at a commit"),
            }
        }

        for tags in map.values_mut() {
            tags.sort();
        }
        Ok(map)
    }

    fn signature(&self, author: &Author) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now(&author.name, &author.email)?),
        }
    }
}

/// Keep an executable bit already recorded in `tree`
fn file_mode(tree: &Tree<'_>, path: &Path) -> FileMode {
    match tree.get_path(path) {
        Ok(entry) if entry.filemode() == i32::from(FileMode::BlobExecutable) => {
            FileMode::BlobExecutable
        }
        _ => FileMode::Blob,
    }
}

impl super::Repository for Git2Repository {
    fn head_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn history(&self) -> Result<Vec<CommitInfo>> {
        let head_oid = match self.repo.head() {
            Ok(head) => head.peel_to_commit()?.id(),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        };

        let mut tags = self.tags_by_commit()?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head_oid)?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                tags: tags.remove(&oid).unwrap_or_default(),
                parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            });
        }

        Ok(commits)
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::config("Bare repositories have no working tree"))
    }

    fn commit_paths(&self, paths: &[&Path], message: &str, author: &Author) -> Result<Oid> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::config("Bare repositories have no working tree"))?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let base_tree = match &parent {
            Some(commit) => commit.tree()?,
            None => self.repo.find_tree(self.repo.treebuilder(None)?.write()?)?,
        };

        let mut update = TreeUpdateBuilder::new();
        for path in paths {
            let blob = self.repo.blob_path(&workdir.join(path))?;
            update.upsert(*path, blob, file_mode(&base_tree, path));
        }
        let tree = self.repo.find_tree(update.create_updated(&self.repo, &base_tree)?)?;

        let signature = self.signature(author)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        // Keep the index in step with the new HEAD for the committed paths
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;

        Ok(oid)
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Any)
                    .map_err(|e| ReleaseError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ReleaseError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| ReleaseError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag: {}", e)))?;

        Ok(())
    }

    fn push_refs(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
            } else {
                git2::Cred::default()
            }
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push rejected for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec_strs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| ReleaseError::remote(format!("Push failed: {}", e)))?;

        Ok(())
    }
}
