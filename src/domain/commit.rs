use crate::config::ConventionalCommitsConfig;
use crate::domain::version::VersionBump;
use regex::Regex;
use std::sync::OnceLock;

fn header_regex() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER
        .get_or_init(|| Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?(!)?:\s*(.*)").ok())
        .as_ref()
}

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Parse a commit message in Conventional Commits format
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text (typed as `chore`)
    pub fn parse(message: &str, breaking_indicators: &[String]) -> Self {
        let has_footer = breaking_indicators
            .iter()
            .any(|indicator| message.contains(indicator.as_str()));
        let header = message.lines().next().unwrap_or_default();

        match header_regex().and_then(|re| re.captures(header)) {
            Some(captures) => ParsedCommit {
                r#type: captures[1].to_string(),
                scope: captures.get(2).map(|m| m.as_str().to_string()),
                description: captures
                    .get(4)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                is_breaking_change: captures.get(3).is_some() || has_footer,
            },
            None => ParsedCommit {
                r#type: "chore".to_string(),
                scope: None,
                description: header.to_string(),
                is_breaking_change: has_footer,
            },
        }
    }

    /// Bump warranted by this commit alone
    pub fn bump(&self, config: &ConventionalCommitsConfig) -> VersionBump {
        if self.is_breaking_change {
            VersionBump::Major
        } else if config.minor_types.iter().any(|t| *t == self.r#type) {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        }
    }
}

/// Highest bump warranted by a set of commit messages.
///
/// Breaking changes win over minor types; everything else, including
/// commits of unknown type, is a patch.
pub fn determine_bump<S: AsRef<str>>(
    messages: &[S],
    config: &ConventionalCommitsConfig,
) -> VersionBump {
    messages
        .iter()
        .map(|message| {
            ParsedCommit::parse(message.as_ref(), &config.breaking_change_indicators).bump(config)
        })
        .max()
        .unwrap_or(VersionBump::Patch)
}
