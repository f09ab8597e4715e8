//! Contributor and commit collection from the GitHub REST API.
//!
//! Reads a list of repository URLs, asks the hosting API how many people
//! contributed to each, and gathers first-line commit messages for later
//! classification. Requests run one at a time with a fixed pause between
//! repositories and a wait-then-retry on rate limiting.

pub mod client;
pub mod collect;
pub mod repos;

pub use client::GitHubClient;
pub use repos::RepoRef;
