#![allow(dead_code)]

use git2::build::TreeUpdateBuilder;
use git2::{FileMode, Repository, RepositoryInitOptions, Signature, Time};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const PYPROJECT: &str = r#"[tool.poetry]
name = "example-project"
version = "0.1.0"
description = "An example project"
"#;

pub const CONFIG: &str = r#"
[[branches]]
name = "main"
match = "develop$"

[[branches]]
name = "feature"
match = ".*"
release = false
prerelease = true

[release]
version_file = "pyproject.toml"
version_key = "tool.poetry.version"
"#;

/// Temporary package repository checked out on `develop`
pub struct PackageRepo {
    pub dir: TempDir,
    pub repo: Repository,
    features: Cell<usize>,
}

impl PackageRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("develop");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Could not init git repo");
        {
            let mut config = repo.config().expect("Could not get config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        fs::write(dir.path().join("pyproject.toml"), PYPROJECT).unwrap();
        fs::write(dir.path().join("CHANGELOG.md"), "").unwrap();

        let package = PackageRepo {
            dir,
            repo,
            features: Cell::new(0),
        };
        package.commit(&["pyproject.toml", "CHANGELOG.md"], "chore: initial commit");
        package
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn commit(&self, files: &[&str], message: &str) {
        let mut index = self.repo.index().unwrap();
        for file in files {
            index.add_path(Path::new(file)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test User", "test@example.com").unwrap();
        let parent = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
    }

    fn new_change(&self, message: &str) -> &Self {
        let n = self.features.get() + 1;
        self.features.set(n);
        let name = format!("feature-{}.txt", n);
        fs::write(self.path().join(&name), format!("feature {}\n", n)).unwrap();
        self.commit(&[&name], message);
        self
    }

    /// Create a new feature commit
    pub fn new_feature(&self) -> &Self {
        self.new_change("feat: some new feature")
    }

    /// Create a new fix commit
    pub fn new_fix(&self) -> &Self {
        self.new_change("fix: some bug")
    }

    /// Fork `side` from the root commit with a feature commit dated long
    /// before everything else, then merge it into HEAD
    pub fn merge_old_side_feature(&self) -> &Self {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        let mut root = head.clone();
        while root.parent_count() > 0 {
            root = root.parent(0).unwrap();
        }

        let blob = self.repo.blob(b"side\n").unwrap();
        let mut update = TreeUpdateBuilder::new();
        update.upsert("side.txt", blob, FileMode::Blob);
        let side_tree = self
            .repo
            .find_tree(update.create_updated(&self.repo, &root.tree().unwrap()).unwrap())
            .unwrap();
        let old = Signature::new("Side Dev", "side@example.com", &Time::new(1_000_000_000, 0))
            .unwrap();
        let side_oid = self
            .repo
            .commit(
                Some("refs/heads/side"),
                &old,
                &old,
                "feat: side feature",
                &side_tree,
                &[&root],
            )
            .unwrap();
        let side = self.repo.find_commit(side_oid).unwrap();

        fs::write(self.path().join("side.txt"), "side\n").unwrap();
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new("side.txt")).unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test User", "test@example.com").unwrap();
        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                "Merge branch 'side'",
                &tree,
                &[&head, &side],
            )
            .unwrap();
        self
    }

    /// Tag the current HEAD
    pub fn new_tag(&self, tag: &str) -> &Self {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo
            .tag_lightweight(tag, head.as_object(), false)
            .unwrap();
        self
    }

    /// Create and checkout a new branch at HEAD
    pub fn checkout_branch(&self, branch: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(branch, &head, false).unwrap();
        self.repo.set_head(&format!("refs/heads/{}", branch)).unwrap();
    }

    pub fn head_message(&self) -> String {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        head.message().unwrap_or_default().to_string()
    }

    pub fn tag_names(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .repo
            .tag_names(None)
            .unwrap()
            .iter()
            .flatten()
            .map(str::to_string)
            .collect();
        tags.sort();
        tags
    }

    pub fn pyproject(&self) -> String {
        fs::read_to_string(self.path().join("pyproject.toml")).unwrap()
    }
}
