//! Per-repository category tallies and their datasets.

use std::path::Path;

use repopulse_core::{PulseError, RawCommitData};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{CommitCategory, CommitClassifier};

/// Category counts for one repository.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTypeCounts {
    pub repo: String,
    pub feat: u64,
    pub fix: u64,
    pub refactor: u64,
    pub ci: u64,
    pub chore: u64,
    pub other: u64,
    pub total_commits: u64,
}

impl CommitTypeCounts {
    fn record(&mut self, category: CommitCategory) {
        let slot = match category {
            CommitCategory::Feat => &mut self.feat,
            CommitCategory::Fix => &mut self.fix,
            CommitCategory::Refactor => &mut self.refactor,
            CommitCategory::Ci => &mut self.ci,
            CommitCategory::Chore => &mut self.chore,
            CommitCategory::Other => &mut self.other,
        };
        *slot += 1;
        self.total_commits += 1;
    }

    pub fn get(&self, category: CommitCategory) -> u64 {
        match category {
            CommitCategory::Feat => self.feat,
            CommitCategory::Fix => self.fix,
            CommitCategory::Refactor => self.refactor,
            CommitCategory::Ci => self.ci,
            CommitCategory::Chore => self.chore,
            CommitCategory::Other => self.other,
        }
    }
}

/// A commit message that matched no category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclassifiedCommit {
    pub repo: String,
    pub message: String,
}

/// Result of classifying every collected commit.
#[derive(Debug, Clone, Default)]
pub struct ClassificationReport {
    /// One row per repository, sorted by repository name.
    pub counts: Vec<CommitTypeCounts>,
    pub unclassified: Vec<UnclassifiedCommit>,
}

/// Classify every commit of every repository.
///
/// # Examples
///
/// ```
/// use repopulse_core::{RawCommitData, RepoCommits};
/// use repopulse_commits::{report::classify_repositories, CommitClassifier};
///
/// let mut raw = RawCommitData::new();
/// raw.insert("api".into(), RepoCommits {
///     repo: "api".into(),
///     owner: "acme".into(),
///     commits: vec!["fix: crash".into(), "Update README".into()],
/// });
/// let report = classify_repositories(&raw, &CommitClassifier::new());
/// assert_eq!(report.counts[0].fix, 1);
/// assert_eq!(report.counts[0].total_commits, 2);
/// assert_eq!(report.unclassified[0].message, "Update README");
/// ```
pub fn classify_repositories(
    raw: &RawCommitData,
    classifier: &CommitClassifier,
) -> ClassificationReport {
    let mut report = ClassificationReport::default();
    for (name, data) in raw {
        let mut counts = CommitTypeCounts {
            repo: name.clone(),
            ..CommitTypeCounts::default()
        };
        for message in &data.commits {
            let category = classifier.classify(message);
            counts.record(category);
            if category == CommitCategory::Other {
                report.unclassified.push(UnclassifiedCommit {
                    repo: name.clone(),
                    message: message.clone(),
                });
            }
        }
        debug!(repo = %name, total = counts.total_commits, other = counts.other, "classified commits");
        report.counts.push(counts);
    }
    report
}

/// Load commits written by the collection stage.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Serialization`] if the JSON is malformed.
pub fn read_raw_commits(path: &Path) -> Result<RawCommitData, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write category counts as CSV.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Csv`] on failure.
pub fn write_commit_counts(path: &Path, counts: &[CommitTypeCounts]) -> Result<(), PulseError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    if counts.is_empty() {
        writer.write_record([
            "repo",
            "feat",
            "fix",
            "refactor",
            "ci",
            "chore",
            "other",
            "total_commits",
        ])?;
    }
    for row in counts {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read category counts written by [`write_commit_counts`].
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Csv`] on malformed rows.
pub fn read_commit_counts(path: &Path) -> Result<Vec<CommitTypeCounts>, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<CommitTypeCounts>, csv::Error>>()?;
    Ok(rows)
}

/// Write unclassified messages as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Serialization`] on failure.
pub fn write_unclassified(path: &Path, commits: &[UnclassifiedCommit]) -> Result<(), PulseError> {
    ensure_parent(path)?;
    std::fs::write(path, serde_json::to_string_pretty(commits)?)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), PulseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repopulse_core::RepoCommits;

    fn raw(entries: Vec<(&str, Vec<&str>)>) -> RawCommitData {
        entries
            .into_iter()
            .map(|(name, commits)| {
                (
                    name.to_string(),
                    RepoCommits {
                        repo: name.to_string(),
                        owner: "acme".into(),
                        commits: commits.iter().map(|c| c.to_string()).collect(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn counts_every_category() {
        let data = raw(vec![(
            "api",
            vec![
                "feat: search",
                "fix: crash",
                "fix: leak",
                "refactor: module",
                "ci: cache",
                "chore: deps",
                "wip",
            ],
        )]);
        let report = classify_repositories(&data, &CommitClassifier::new());
        let row = &report.counts[0];
        assert_eq!(
            (row.feat, row.fix, row.refactor, row.ci, row.chore, row.other),
            (1, 2, 1, 1, 1, 1)
        );
        assert_eq!(row.total_commits, 7);
        let sum: u64 = CommitCategory::ALL.iter().map(|c| row.get(*c)).sum();
        assert_eq!(sum, row.total_commits);
        assert_eq!(report.unclassified.len(), 1);
    }

    #[test]
    fn repository_without_commits_has_zero_row() {
        let report = classify_repositories(&raw(vec![("empty", vec![])]), &CommitClassifier::new());
        assert_eq!(report.counts.len(), 1);
        assert_eq!(report.counts[0].total_commits, 0);
    }

    #[test]
    fn rows_sorted_by_repository() {
        let data = raw(vec![("zeta", vec!["x"]), ("alpha", vec!["y"])]);
        let report = classify_repositories(&data, &CommitClassifier::new());
        let names: Vec<_> = report.counts.iter().map(|c| c.repo.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn counts_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/commits_types.csv");
        let rows = vec![CommitTypeCounts {
            repo: "api".into(),
            feat: 3,
            fix: 2,
            total_commits: 5,
            ..CommitTypeCounts::default()
        }];
        write_commit_counts(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("repo,feat,fix,refactor,ci,chore,other,total_commits\n"));
        assert_eq!(read_commit_counts(&path).unwrap(), rows);
    }

    #[test]
    fn empty_counts_still_have_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commits_types.csv");
        write_commit_counts(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "repo,feat,fix,refactor,ci,chore,other,total_commits\n"
        );
        assert!(read_commit_counts(&path).unwrap().is_empty());
    }

    #[test]
    fn raw_commits_missing_file() {
        let result = read_raw_commits(Path::new("/nonexistent/raw.json"));
        assert!(matches!(result, Err(PulseError::FileNotFound(_))));
    }
}
