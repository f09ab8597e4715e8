//! Balanced, order-preserving three-way partition of repositories.
//!
//! Repositories are bucketed by exact contributor count, buckets are sorted
//! ascending, and the bucket sequence is cut into a prefix, an infix and a
//! suffix whose sizes come as close to `total / 3` as whole buckets allow.
//! A bucket is never split, so equal counts always share a group.

use std::collections::HashMap;

use repopulse_core::{ActivityGroup, ContributorRecord, GroupAssignment};
use serde::Serialize;

/// All repositories sharing one contributor count.
///
/// # Examples
///
/// ```
/// use repopulse_core::ContributorRecord;
/// use repopulse_groups::partition::build_buckets;
///
/// let records = vec![
///     ContributorRecord::new("b", 3),
///     ContributorRecord::new("a", 3),
///     ContributorRecord::new("c", 1),
/// ];
/// let buckets = build_buckets(&records);
/// assert_eq!(buckets[0].contributors, 1);
/// assert_eq!(buckets[1].repos, vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// The shared contributor count.
    pub contributors: u64,
    /// Member repository ids, sorted.
    pub repos: Vec<String>,
}

impl Bucket {
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Cumulative repository counts at which each group boundary should fall.
///
/// # Examples
///
/// ```
/// use repopulse_groups::partition::Thresholds;
///
/// let t = Thresholds::for_total(6);
/// assert_eq!((t.first, t.second), (2, 4));
///
/// let t = Thresholds::for_total(7);
/// assert_eq!((t.first, t.second), (3, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// `ceil(total / 3)`.
    pub first: usize,
    /// `ceil(2 * total / 3)`.
    pub second: usize,
}

impl Thresholds {
    pub fn for_total(total: usize) -> Self {
        Self {
            first: total.div_ceil(3),
            second: (2 * total).div_ceil(3),
        }
    }
}

/// Group a list of records into buckets keyed by contributor count.
///
/// Duplicate repository ids keep the last record seen. Buckets come back in
/// ascending count order with members sorted by id, independent of input order.
pub fn build_buckets(records: &[ContributorRecord]) -> Vec<Bucket> {
    let mut latest: HashMap<&str, u64> = HashMap::with_capacity(records.len());
    for record in records {
        latest.insert(record.repo.as_str(), record.contributors);
    }

    let mut by_count: HashMap<u64, Vec<String>> = HashMap::new();
    for (repo, contributors) in latest {
        by_count
            .entry(contributors)
            .or_default()
            .push(repo.to_string());
    }

    let mut buckets: Vec<Bucket> = by_count
        .into_iter()
        .map(|(contributors, mut repos)| {
            repos.sort();
            Bucket {
                contributors,
                repos,
            }
        })
        .collect();
    buckets.sort_by_key(|b| b.contributors);
    buckets
}

/// Indices of the last bucket in group 1 and in group 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cuts {
    first: Option<usize>,
    second: Option<usize>,
}

impl Cuts {
    /// First bucket whose running total reaches or exceeds each threshold.
    ///
    /// When that would leave group 3 empty while group 2 holds two or more
    /// buckets, the last bucket moves up to group 3.
    fn locate(buckets: &[Bucket], thresholds: Thresholds) -> Self {
        let mut cuts = Cuts {
            first: None,
            second: None,
        };
        let mut running = 0usize;
        for (idx, bucket) in buckets.iter().enumerate() {
            running += bucket.len();
            if cuts.first.is_none() && running >= thresholds.first {
                cuts.first = Some(idx);
            }
            if cuts.second.is_none() && running >= thresholds.second {
                cuts.second = Some(idx);
                break;
            }
        }

        if let (Some(first), Some(second)) = (cuts.first, cuts.second) {
            if second + 1 == buckets.len() && second >= first + 2 {
                cuts.second = Some(second - 1);
            }
        }
        cuts
    }

    fn group_of(self, idx: usize) -> ActivityGroup {
        match (self.first, self.second) {
            (None, _) => ActivityGroup::Low,
            (Some(first), None) => {
                if idx <= first {
                    ActivityGroup::Low
                } else {
                    ActivityGroup::Medium
                }
            }
            (Some(first), Some(second)) => {
                if idx <= first {
                    ActivityGroup::Low
                } else if idx <= second {
                    ActivityGroup::Medium
                } else {
                    ActivityGroup::High
                }
            }
        }
    }
}

/// Number of repositories that landed in each group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSizes {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl GroupSizes {
    pub fn get(&self, group: ActivityGroup) -> usize {
        match group {
            ActivityGroup::Low => self.low,
            ActivityGroup::Medium => self.medium,
            ActivityGroup::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Contributor-count span covered by one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRange {
    pub group: ActivityGroup,
    pub min_contributors: u64,
    pub max_contributors: u64,
    pub repos: usize,
}

/// A computed partition: every bucket paired with its group.
///
/// # Examples
///
/// ```
/// use repopulse_core::{ActivityGroup, ContributorRecord};
/// use repopulse_groups::partition::Partition;
///
/// let records: Vec<_> = [("a", 0), ("b", 0), ("c", 1), ("d", 2), ("e", 2), ("f", 2)]
///     .into_iter()
///     .map(|(repo, n)| ContributorRecord::new(repo, n))
///     .collect();
/// let partition = Partition::compute(&records);
/// let sizes = partition.sizes();
/// assert_eq!((sizes.low, sizes.medium, sizes.high), (2, 1, 3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Partition {
    buckets: Vec<(Bucket, ActivityGroup)>,
}

impl Partition {
    pub fn compute(records: &[ContributorRecord]) -> Self {
        let buckets = build_buckets(records);
        let total: usize = buckets.iter().map(Bucket::len).sum();
        if total == 0 {
            return Self::default();
        }

        let cuts = Cuts::locate(&buckets, Thresholds::for_total(total));
        let buckets = buckets
            .into_iter()
            .enumerate()
            .map(|(idx, bucket)| (bucket, cuts.group_of(idx)))
            .collect();
        Self { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in ascending contributor order with their groups.
    pub fn buckets(&self) -> &[(Bucket, ActivityGroup)] {
        &self.buckets
    }

    /// One assignment per repository, sorted by repository id.
    pub fn assignments(&self) -> Vec<GroupAssignment> {
        let mut assignments: Vec<GroupAssignment> = self
            .buckets
            .iter()
            .flat_map(|(bucket, group)| {
                bucket.repos.iter().map(move |repo| GroupAssignment {
                    repo: repo.clone(),
                    group: *group,
                })
            })
            .collect();
        assignments.sort_by(|a, b| a.repo.cmp(&b.repo));
        assignments
    }

    pub fn sizes(&self) -> GroupSizes {
        let mut sizes = GroupSizes::default();
        for (bucket, group) in &self.buckets {
            match group {
                ActivityGroup::Low => sizes.low += bucket.len(),
                ActivityGroup::Medium => sizes.medium += bucket.len(),
                ActivityGroup::High => sizes.high += bucket.len(),
            }
        }
        sizes
    }

    /// Contributor span of each non-empty group, in group order.
    pub fn ranges(&self) -> Vec<GroupRange> {
        let mut ranges: Vec<GroupRange> = Vec::new();
        for (bucket, group) in &self.buckets {
            match ranges.last_mut() {
                Some(range) if range.group == *group => {
                    range.max_contributors = bucket.contributors;
                    range.repos += bucket.len();
                }
                _ => ranges.push(GroupRange {
                    group: *group,
                    min_contributors: bucket.contributors,
                    max_contributors: bucket.contributors,
                    repos: bucket.len(),
                }),
            }
        }
        ranges
    }
}

/// Assign every repository to activity group 1, 2 or 3.
///
/// The result is sorted by repository id and empty for empty input.
///
/// # Examples
///
/// ```
/// use repopulse_core::{ActivityGroup, ContributorRecord};
/// use repopulse_groups::partition::partition;
///
/// let records = vec![
///     ContributorRecord::new("c", 3),
///     ContributorRecord::new("a", 1),
///     ContributorRecord::new("b", 2),
/// ];
/// let groups: Vec<_> = partition(&records).into_iter().map(|a| a.group).collect();
/// assert_eq!(groups, vec![ActivityGroup::Low, ActivityGroup::Medium, ActivityGroup::High]);
/// ```
pub fn partition(records: &[ContributorRecord]) -> Vec<GroupAssignment> {
    Partition::compute(records).assignments()
}
