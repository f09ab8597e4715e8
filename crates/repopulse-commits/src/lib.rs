//! Commit-message classification and activity ratios.
//!
//! Labels each first-line commit message with a coarse category by keyword,
//! tallies categories per repository, and relates those tallies to
//! contributor counts.

pub mod activity;
pub mod classify;
pub mod report;

pub use classify::{CommitCategory, CommitClassifier};
