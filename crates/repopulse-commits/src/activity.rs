//! Commit-mix ratios set against contributor counts.

use std::collections::HashMap;

use repopulse_core::ContributorRecord;
use serde::Serialize;

use crate::report::CommitTypeCounts;

/// Commit-mix ratios for one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRatio {
    pub repo: String,
    pub contributors: u64,
    pub total_commits: u64,
    /// `fix / total_commits`; `None` without commits.
    pub fix_ratio: Option<f64>,
    /// `refactor / feat`; `None` without feature commits.
    pub refactor_per_feat: Option<f64>,
}

/// Join commit counts with contributor counts on repository name.
///
/// Repositories missing from either side are dropped. Rows come back ordered
/// by contributor count, then name.
///
/// # Examples
///
/// ```
/// use repopulse_core::ContributorRecord;
/// use repopulse_commits::activity::activity_ratios;
/// use repopulse_commits::report::CommitTypeCounts;
///
/// let counts = vec![CommitTypeCounts {
///     repo: "api".into(),
///     feat: 4,
///     fix: 5,
///     refactor: 2,
///     total_commits: 10,
///     ..Default::default()
/// }];
/// let ratios = activity_ratios(&counts, &[ContributorRecord::new("api", 7)]);
/// assert_eq!(ratios[0].fix_ratio, Some(0.5));
/// assert_eq!(ratios[0].refactor_per_feat, Some(0.5));
/// ```
pub fn activity_ratios(
    counts: &[CommitTypeCounts],
    contributors: &[ContributorRecord],
) -> Vec<ActivityRatio> {
    let by_repo: HashMap<&str, u64> = contributors
        .iter()
        .map(|r| (r.repo.as_str(), r.contributors))
        .collect();

    let mut ratios: Vec<ActivityRatio> = counts
        .iter()
        .filter_map(|row| {
            let contributors = *by_repo.get(row.repo.as_str())?;
            Some(ActivityRatio {
                repo: row.repo.clone(),
                contributors,
                total_commits: row.total_commits,
                fix_ratio: ratio(row.fix, row.total_commits),
                refactor_per_feat: ratio(row.refactor, row.feat),
            })
        })
        .collect();
    ratios.sort_by(|a, b| {
        a.contributors
            .cmp(&b.contributors)
            .then_with(|| a.repo.cmp(&b.repo))
    });
    ratios
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(repo: &str, feat: u64, fix: u64, refactor: u64, total: u64) -> CommitTypeCounts {
        CommitTypeCounts {
            repo: repo.into(),
            feat,
            fix,
            refactor,
            total_commits: total,
            ..CommitTypeCounts::default()
        }
    }

    #[test]
    fn zero_denominators_give_none() {
        let rows = vec![counts("quiet", 0, 0, 3, 0)];
        let ratios = activity_ratios(&rows, &[ContributorRecord::new("quiet", 1)]);
        assert_eq!(ratios[0].fix_ratio, None);
        assert_eq!(ratios[0].refactor_per_feat, None);
    }

    #[test]
    fn unmatched_repositories_are_dropped() {
        let rows = vec![counts("api", 1, 1, 0, 2), counts("orphan", 1, 0, 0, 1)];
        let ratios = activity_ratios(&rows, &[ContributorRecord::new("api", 3)]);
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].repo, "api");
    }

    #[test]
    fn ordered_by_contributors() {
        let rows = vec![counts("big", 1, 1, 1, 4), counts("small", 2, 0, 0, 2)];
        let people = [
            ContributorRecord::new("big", 40),
            ContributorRecord::new("small", 2),
        ];
        let ratios = activity_ratios(&rows, &people);
        let names: Vec<_> = ratios.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(names, vec!["small", "big"]);
        assert_eq!(ratios[1].fix_ratio, Some(0.25));
    }
}
