use thiserror::Error;

/// Unified error type for ci-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("No branch rule matches branch '{branch}'")]
    NoMatchingBranch { branch: String },

    /// The release commit exists but a later step failed. Not retried.
    #[error("Release of v{version} partially applied, failed while {stage}: {source}")]
    PartialRelease {
        version: String,
        stage: &'static str,
        #[source]
        source: Box<ReleaseError>,
    },

    #[error("Invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid TOML document: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error("Cannot serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in ci-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Wrap an error raised after the release commit was written
    pub fn partial(version: impl Into<String>, stage: &'static str, source: ReleaseError) -> Self {
        ReleaseError::PartialRelease {
            version: version.into(),
            stage,
            source: Box::new(source),
        }
    }

    /// True when the repository was left half-released
    pub fn is_partial_release(&self) -> bool {
        matches!(self, ReleaseError::PartialRelease { .. })
    }
}
