pub mod boundary;
pub mod ci;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod publish;
pub mod release;
pub mod resolver;
pub mod ui;
pub mod version_file;

pub use ci::{CiContext, CiSystem};
pub use error::{ReleaseError, Result};
pub use resolver::{ReleaseDecision, ReleaseVersionResolver, RepositoryState, Resolution};
