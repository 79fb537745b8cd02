use crate::error::{ReleaseError, Result};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Prerelease train marker: `{token}.{number}`, e.g. `rc1.dev.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prerelease {
    pub token: String,
    pub number: u64,
}

impl Prerelease {
    /// Create a prerelease marker. `number` starts at 1.
    pub fn new(token: impl Into<String>, number: u64) -> Self {
        Prerelease {
            token: token.into(),
            number,
        }
    }

    /// Parse `token.N`; the token is everything before the last dot.
    pub fn parse(s: &str) -> Result<Self> {
        let (token, number) = s.rsplit_once('.').ok_or_else(|| {
            ReleaseError::version(format!("Prerelease '{}' has no train number", s))
        })?;

        let number = number.parse::<u64>().map_err(|_| {
            ReleaseError::version(format!("Invalid prerelease number: '{}'", number))
        })?;
        if number == 0 {
            return Err(ReleaseError::version(format!(
                "Prerelease number must be positive in '{}'",
                s
            )));
        }
        Self::validate_token(token)?;

        Ok(Prerelease::new(token, number))
    }

    /// Checks that `token` yields a valid semver prerelease once numbered.
    pub fn validate_token(token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(ReleaseError::version("Empty prerelease token"));
        }
        semver::Prerelease::new(&format!("{}.1", token)).map_err(|e| {
            ReleaseError::version(format!("Invalid prerelease token '{}': {}", token, e))
        })?;
        Ok(())
    }

    /// Next number in the same train
    pub fn next(&self) -> Result<Self> {
        let number = increment(self.number, "prerelease number")?;
        Ok(Prerelease::new(self.token.clone(), number))
    }
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.token, self.number)
    }
}

/// Semantic version with an optional prerelease train.
///
/// Releases order by `(major, minor, patch)`. A prerelease sorts before the
/// release with the same numbers; prereleases of equal numbers compare by
/// token, then by train number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<Prerelease>,
}

impl Version {
    /// Version reported for the first release of a repository
    pub const INITIAL: Version = Version {
        major: 0,
        minor: 0,
        patch: 0,
        prerelease: None,
    };

    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse a bare version such as `1.2.3` or `0.2.0-rc1.dev.1`
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s.trim())
            .map_err(|e| ReleaseError::version(format!("Invalid version '{}': {}", s, e)))?;

        if !parsed.build.is_empty() {
            return Err(ReleaseError::version(format!(
                "Build metadata is not supported: '{}'",
                s
            )));
        }

        let prerelease = if parsed.pre.is_empty() {
            None
        } else {
            Some(Prerelease::parse(parsed.pre.as_str())?)
        };

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    /// Parse a tag name (`v1.2.3`, `V1.2.3-rc.1`)
    pub fn from_tag(tag: &str) -> Result<Self> {
        let bare = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .ok_or_else(|| ReleaseError::tag(format!("Tag '{}' has no 'v' prefix", tag)))?;
        Self::parse(bare)
    }

    /// Tag name for this version
    pub fn as_tag(&self) -> String {
        format!("v{}", self)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Same version without its prerelease marker
    pub fn release(&self) -> Self {
        Version::new(self.major, self.minor, self.patch)
    }

    /// True when both share `(major, minor, patch)`
    pub fn same_release(&self, other: &Version) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }

    /// Attach a prerelease marker
    pub fn with_prerelease(&self, token: impl Into<String>, number: u64) -> Self {
        Version {
            prerelease: Some(Prerelease::new(token, number)),
            ..self.release()
        }
    }

    /// Bump release numbers; any prerelease marker is dropped.
    ///
    /// Fails when the bumped component is already `u64::MAX`.
    pub fn bump(&self, bump_type: VersionBump) -> Result<Self> {
        let bumped = match bump_type {
            VersionBump::Major => Version::new(increment(self.major, "major")?, 0, 0),
            VersionBump::Minor => Version::new(self.major, increment(self.minor, "minor")?, 0),
            VersionBump::Patch => {
                Version::new(self.major, self.minor, increment(self.patch, "patch")?)
            }
        };
        Ok(bumped)
    }
}

fn increment(value: u64, component: &str) -> Result<u64> {
    value.checked_add(1).ok_or_else(|| {
        ReleaseError::version(format!("Cannot increment {} beyond {}", component, value))
    })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.token.cmp(&b.token).then(a.number.cmp(&b.number)),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_tag())
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
        }
    }
}
