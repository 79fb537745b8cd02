//! Domain logic - pure release rules independent of git operations

pub mod branch;
pub mod commit;
pub mod version;

pub use branch::{BranchPolicy, BranchRule};
pub use commit::{determine_bump, ParsedCommit};
pub use version::{Prerelease, Version, VersionBump};
