//! Contributor-activity grouping and quality-by-group summaries.
//!
//! Partitions repositories into three activity groups by contributor count
//! without ever separating repositories that share a count, persists the
//! assignment as CSV, and joins it against quality scores for reporting.

pub mod dataset;
pub mod partition;
pub mod summary;

pub use partition::{partition, Partition};
