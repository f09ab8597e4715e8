//! Core types, configuration, and error handling for repopulse.
//!
//! This crate provides the shared foundation used by every pipeline stage:
//! - [`PulseError`]: unified error type using `thiserror` and `miette`
//! - [`PulseConfig`]: configuration loaded from `.repopulse.toml`
//! - Shared types: [`ContributorRecord`], [`ActivityGroup`],
//!   [`GroupAssignment`], [`RepoCommits`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GitHubConfig, PathsConfig, PulseConfig, SonarConfig};
pub use error::PulseError;
pub use types::{
    ActivityGroup, ContributorRecord, GroupAssignment, OutputFormat, RawCommitData, RepoCommits,
};

/// A convenience `Result` type for repopulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
