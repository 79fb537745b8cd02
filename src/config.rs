use crate::domain::{BranchPolicy, BranchRule};
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Represents the complete configuration for ci-release.
///
/// Contains the ordered branch rules, conventional commit settings and the
/// release commit options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_branches")]
    pub branches: Vec<BranchRule>,

    #[serde(default)]
    pub conventional_commits: ConventionalCommitsConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Returns the default branch rules: full releases from `main`/`master`,
/// prereleases from everything else.
fn default_branches() -> Vec<BranchRule> {
    vec![
        BranchRule::new("main", "(main|master)$"),
        BranchRule::new("feature", ".*")
            .release_branch(false)
            .prerelease("rc"),
    ]
}

/// Returns the default commit types that trigger minor version bumps.
fn default_minor_types() -> Vec<String> {
    vec!["feat".to_string()]
}

/// Returns the default list of breaking change indicators.
fn default_breaking_change_indicators() -> Vec<String> {
    vec![
        "BREAKING CHANGE:".to_string(),
        "BREAKING-CHANGE:".to_string(),
    ]
}

/// Configuration for conventional commit analysis.
///
/// Breaking changes always bump major, `minor_types` bump minor and every
/// other commit bumps patch.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConventionalCommitsConfig {
    #[serde(default = "default_minor_types")]
    pub minor_types: Vec<String>,

    #[serde(default = "default_breaking_change_indicators")]
    pub breaking_change_indicators: Vec<String>,
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        ConventionalCommitsConfig {
            minor_types: default_minor_types(),
            breaking_change_indicators: default_breaking_change_indicators(),
        }
    }
}

fn default_version_key() -> String {
    "package.version".to_string()
}

fn default_commit_message() -> String {
    "chore(release): v{version}".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_author_name() -> String {
    "ci-release".to_string()
}

fn default_author_email() -> String {
    "ci-release@localhost".to_string()
}

/// Options for the release commit.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Version metadata file, relative to the repository root
    #[serde(default)]
    pub version_file: Option<PathBuf>,

    /// Dotted key path of the version field inside `version_file`
    #[serde(default = "default_version_key")]
    pub version_key: String,

    /// `{version}` is replaced by the new version
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default)]
    pub push: bool,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Used when git has no `user.name`/`user.email`
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            version_file: None,
            version_key: default_version_key(),
            commit_message: default_commit_message(),
            push: false,
            remote: default_remote(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            branches: default_branches(),
            conventional_commits: ConventionalCommitsConfig::default(),
            release: ReleaseConfig::default(),
        }
    }
}

impl Config {
    /// Compile the branch rules in declaration order
    pub fn branch_policy(&self) -> Result<BranchPolicy> {
        if self.branches.is_empty() {
            return Err(ReleaseError::config("No branch rules configured"));
        }
        BranchPolicy::from_rules(self.branches.clone())
    }

    /// Check everything that can be checked before touching a repository
    pub fn validate(&self) -> Result<()> {
        self.branch_policy()?;
        if !self.release.commit_message.contains("{version}") {
            return Err(ReleaseError::config(
                "release.commit_message must contain {version} placeholder",
            ));
        }
        if self.release.version_key.split('.').any(str::is_empty) {
            return Err(ReleaseError::config(format!(
                "Invalid release.version_key '{}'",
                self.release.version_key
            )));
        }
        Ok(())
    }
}

/// Per-invocation overrides supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOverrides {
    pub prerelease_requested: bool,
    pub prerelease_token: Option<String>,
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in `search_dir`
/// 3. `ci-release.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, search_dir: &Path) -> Result<Config> {
    let candidate = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = search_dir.join(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                dirs::config_dir()
                    .map(|dir| dir.join("ci-release.toml"))
                    .filter(|path| path.exists())
            }
        }
    };

    match candidate {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            let content = fs::read_to_string(&path).map_err(|e| {
                ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            parse_config(&content)
        }
        None => {
            tracing::debug!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}
