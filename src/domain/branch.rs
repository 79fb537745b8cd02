use crate::domain::version::Prerelease;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_prerelease_token() -> String {
    "rc".to_string()
}

/// Release behaviour for branches whose name matches `pattern`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchRule {
    pub name: String,

    /// Regex, anchored at the start of the branch name
    #[serde(rename = "match")]
    pub pattern: String,

    #[serde(default = "default_true", rename = "release")]
    pub is_release_branch: bool,

    #[serde(default)]
    pub prerelease: bool,

    /// Empty means this branch never produces prereleases
    #[serde(default = "default_prerelease_token")]
    pub prerelease_token: String,
}

impl BranchRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        BranchRule {
            name: name.into(),
            pattern: pattern.into(),
            is_release_branch: true,
            prerelease: false,
            prerelease_token: default_prerelease_token(),
        }
    }

    pub fn release_branch(mut self, is_release_branch: bool) -> Self {
        self.is_release_branch = is_release_branch;
        self
    }

    pub fn prerelease(mut self, token: impl Into<String>) -> Self {
        self.prerelease = true;
        self.prerelease_token = token.into();
        self
    }

    pub fn allows_prerelease(&self) -> bool {
        self.prerelease && !self.prerelease_token.is_empty()
    }
}

/// Ordered branch rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct BranchPolicy {
    rules: Vec<(BranchRule, Regex)>,
}

impl BranchPolicy {
    /// Compile the rules, failing on bad patterns or tokens
    pub fn from_rules(rules: Vec<BranchRule>) -> Result<Self> {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                let regex = Regex::new(&format!("^(?:{})", rule.pattern)).map_err(|e| {
                    ReleaseError::config(format!(
                        "Invalid pattern '{}' for branch rule '{}': {}",
                        rule.pattern, rule.name, e
                    ))
                })?;
                if !rule.prerelease_token.is_empty() {
                    Prerelease::validate_token(&rule.prerelease_token).map_err(|e| {
                        ReleaseError::config(format!("Branch rule '{}': {}", rule.name, e))
                    })?;
                }
                Ok((rule, regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BranchPolicy { rules: compiled })
    }

    /// First rule whose pattern matches `branch`
    pub fn select(&self, branch: &str) -> Result<&BranchRule> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(branch))
            .map(|(rule, _)| rule)
            .ok_or_else(|| ReleaseError::NoMatchingBranch {
                branch: branch.to_string(),
            })
    }

    /// Rewrite the token of every rule that has one; empty tokens stay empty.
    pub fn with_prerelease_token(&self, token: &str) -> Result<Self> {
        Prerelease::validate_token(token)?;
        let rules = self
            .rules
            .iter()
            .map(|(rule, regex)| {
                let mut rule = rule.clone();
                if !rule.prerelease_token.is_empty() {
                    rule.prerelease_token = token.to_string();
                }
                (rule, regex.clone())
            })
            .collect();
        Ok(BranchPolicy { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = &BranchRule> {
        self.rules.iter().map(|(rule, _)| rule)
    }

    pub fn rule(&self, name: &str) -> Option<&BranchRule> {
        self.rules().find(|rule| rule.name == name)
    }
}
