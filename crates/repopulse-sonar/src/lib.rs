//! SonarQube quality scoring and issue export.
//!
//! Turns a project's reliability, maintainability and security ratings plus
//! its duplication and cognitive-complexity measures into a single 0–100
//! quality score, exports the project's issues, and keeps the per-repository
//! score dataset that the grouping summary joins against.

pub mod client;
pub mod export;
pub mod score;

pub use client::SonarClient;
pub use score::QualityScore;
