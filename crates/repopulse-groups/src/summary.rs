//! Quality scores joined against activity groups.
//!
//! Reads the `repo_url,score` dataset maintained by the SonarQube stage,
//! joins it to group assignments on repository id, and computes descriptive
//! statistics per group and overall.

use std::collections::HashMap;
use std::path::Path;

use repopulse_core::{ActivityGroup, GroupAssignment, PulseError};
use serde::Serialize;
use tracing::{debug, warn};

/// A repository together with its quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRepo {
    pub repo: String,
    pub score: f64,
}

/// Repository id from a hosting URL: its last non-empty path segment.
///
/// # Examples
///
/// ```
/// use repopulse_groups::summary::repo_id_from_url;
///
/// assert_eq!(repo_id_from_url("https://github.com/acme/api-server/"), "api-server");
/// assert_eq!(repo_id_from_url("https://github.com/acme/api.git"), "api");
/// assert_eq!(repo_id_from_url("site"), "site");
/// ```
pub fn repo_id_from_url(url: &str) -> &str {
    let last = url
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    // same id the contributor collector derives from the URL
    last.strip_suffix(".git").unwrap_or(last)
}

/// Read per-repository quality scores from a CSV with `repo_url` and `score`
/// columns.
///
/// Rows whose score does not parse as a number are skipped.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Config`] if either column is missing from the header.
pub fn read_quality_scores(path: &Path) -> Result<Vec<ScoredRepo>, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            PulseError::Config(format!("{} has no '{name}' column", path.display()))
        })
    };
    let url_col = column("repo_url")?;
    let score_col = column("score")?;

    let mut scores = Vec::new();
    for result in reader.records() {
        let record = result?;
        let url = record.get(url_col).unwrap_or_default();
        let repo = repo_id_from_url(url);
        if repo.is_empty() {
            continue;
        }
        let raw = record.get(score_col).unwrap_or_default();
        match raw.parse::<f64>() {
            Ok(score) if score.is_finite() => scores.push(ScoredRepo {
                repo: repo.to_string(),
                score,
            }),
            _ => warn!(repo, value = raw, "skipping unparsable quality score"),
        }
    }

    debug!(path = %path.display(), scores = scores.len(), "read quality scores");
    Ok(scores)
}

/// Descriptive statistics over a set of scores.
///
/// # Examples
///
/// ```
/// use repopulse_groups::summary::ScoreStats;
///
/// let stats = ScoreStats::from_scores(&[40.0, 80.0, 60.0]).unwrap();
/// assert_eq!(stats.median, 60.0);
/// assert_eq!(stats.mean, 60.0);
/// assert_eq!(stats.std_dev, 20.0);
/// assert!(ScoreStats::from_scores(&[]).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `0.0` for a single score.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };
        let std_dev = if count > 1 {
            let variance =
                sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            mean,
            median,
            std_dev,
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Joined scores for one activity group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuality {
    pub group: ActivityGroup,
    /// Repositories ordered by ascending score.
    pub repos: Vec<ScoredRepo>,
    pub stats: Option<ScoreStats>,
}

/// Quality broken down by activity group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    /// Always three entries, one per group, in group order.
    pub groups: Vec<GroupQuality>,
    /// Statistics over every joined repository.
    pub overall: Option<ScoreStats>,
    /// Assigned repositories with no quality score.
    pub unscored: Vec<String>,
}

/// Inner-join assignments with scores and summarize each group.
///
/// When a repository has several scores the last one wins.
pub fn summarize_by_group(
    assignments: &[GroupAssignment],
    scores: &[ScoredRepo],
) -> QualitySummary {
    let by_repo: HashMap<&str, f64> = scores.iter().map(|s| (s.repo.as_str(), s.score)).collect();

    let mut per_group: HashMap<ActivityGroup, Vec<ScoredRepo>> = HashMap::new();
    let mut unscored = Vec::new();
    for assignment in assignments {
        match by_repo.get(assignment.repo.as_str()) {
            Some(&score) => per_group.entry(assignment.group).or_default().push(ScoredRepo {
                repo: assignment.repo.clone(),
                score,
            }),
            None => unscored.push(assignment.repo.clone()),
        }
    }
    unscored.sort();

    let mut all_scores = Vec::new();
    let groups = ActivityGroup::ALL
        .into_iter()
        .map(|group| {
            let mut repos = per_group.remove(&group).unwrap_or_default();
            repos.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.repo.cmp(&b.repo)));
            let values: Vec<f64> = repos.iter().map(|r| r.score).collect();
            all_scores.extend_from_slice(&values);
            GroupQuality {
                group,
                stats: ScoreStats::from_scores(&values),
                repos,
            }
        })
        .collect();

    QualitySummary {
        groups,
        overall: ScoreStats::from_scores(&all_scores),
        unscored,
    }
}
