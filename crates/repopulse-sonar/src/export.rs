//! Issue reports and the cross-project quality summary.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use repopulse_core::PulseError;
use tracing::{debug, warn};

use crate::client::SonarIssue;
use crate::score::QualityScore;

/// Column header of the per-project issue report.
pub const ISSUE_HEADER: [&str; 8] = [
    "severity",
    "type",
    "component",
    "line",
    "message",
    "effort",
    "status",
    "project_score",
];

/// Column header of the quality summary consumed by `summary`.
pub const SUMMARY_HEADER: [&str; 2] = ["repo_url", "score"];

/// Write a project's issues as CSV, preceded by a `#` metadata line with the
/// component scores.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Csv`] on write failure.
pub fn write_issue_report<W: Write>(
    mut writer: W,
    project_key: &str,
    score: &QualityScore,
    issues: &[SonarIssue],
) -> Result<(), PulseError> {
    writeln!(
        writer,
        "# project_key={project_key}, project_score={:.2}/100, reliability={:.0}, \
         maintainability={:.0}, security={:.0}, duplication={:.2}, complexity={:.2}",
        score.score,
        score.reliability,
        score.maintainability,
        score.security,
        score.duplication,
        score.complexity,
    )?;

    let project_score = format!("{:.2}", score.score);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(ISSUE_HEADER)?;
    for issue in issues {
        let line = issue.line.map(|l| l.to_string()).unwrap_or_default();
        let effort = issue.effort.clone().unwrap_or_default();
        csv_writer.write_record([
            issue.severity.as_str(),
            issue.kind.as_str(),
            issue.component.as_str(),
            line.as_str(),
            issue.message.as_str(),
            effort.as_str(),
            issue.status.as_str(),
            project_score.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// [`write_issue_report`] into a file, creating parent directories.
///
/// # Errors
///
/// Same as [`write_issue_report`].
pub fn write_issue_report_file(
    path: &Path,
    project_key: &str,
    score: &QualityScore,
    issues: &[SonarIssue],
) -> Result<(), PulseError> {
    ensure_parent(path)?;
    let file = std::fs::File::create(path)?;
    write_issue_report(std::io::BufWriter::new(file), project_key, score, issues)
}

/// Record `score` for `repo_url` in the summary CSV.
///
/// An existing row for the same URL is replaced; rows are kept sorted by URL.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Csv`] if the summary cannot be
/// read or rewritten, or [`PulseError::Config`] if an existing summary lacks
/// the `repo_url` or `score` column.
pub fn upsert_quality_summary(path: &Path, repo_url: &str, score: f64) -> Result<(), PulseError> {
    let mut rows: BTreeMap<String, String> = BTreeMap::new();

    if path.exists() {
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
        let url_col = column(SUMMARY_HEADER[0])?;
        let score_col = column(SUMMARY_HEADER[1])?;

        for record in reader.records() {
            let record = record?;
            match (record.get(url_col), record.get(score_col)) {
                (Some(url), Some(value)) if !url.is_empty() => {
                    rows.insert(url.to_string(), value.to_string());
                }
                _ => warn!(path = %path.display(), "skipping malformed summary row"),
            }
        }
    }

    let replaced = rows
        .insert(repo_url.to_string(), format!("{score:.2}"))
        .is_some();
    debug!(repo_url, score, replaced, "updating quality summary");

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(SUMMARY_HEADER)?;
    for (url, value) in &rows {
        writer.write_record([url.as_str(), value.as_str()])?;
    }
    writer.flush()?;
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

    fn score() -> QualityScore {
        QualityScore {
            reliability: 80.0,
            maintainability: 100.0,
            security: 60.0,
            duplication: 87.5,
            complexity: 60.0,
            score: 78.5,
        }
    }

    #[test]
    fn issue_report_layout() {
        let issues = vec![
            SonarIssue {
                severity: "MAJOR".into(),
                kind: "BUG".into(),
                component: "api:src/main.py".into(),
                line: Some(12),
                message: "Null dereference, maybe".into(),
                effort: Some("5min".into()),
                status: "OPEN".into(),
            },
            SonarIssue {
                severity: "INFO".into(),
                kind: "CODE_SMELL".into(),
                component: "api".into(),
                ..SonarIssue::default()
            },
        ];
        let mut out = Vec::new();
        write_issue_report(&mut out, "api", &score(), &issues).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "# project_key=api, project_score=78.50/100, reliability=80, maintainability=100, \
             security=60, duplication=87.50, complexity=60.00"
        );
        assert_eq!(lines[1], ISSUE_HEADER.join(","));
        assert_eq!(
            lines[2],
            "MAJOR,BUG,api:src/main.py,12,\"Null dereference, maybe\",5min,OPEN,78.50"
        );
        assert_eq!(lines[3], "INFO,CODE_SMELL,api,,,,,78.50");
    }

    #[test]
    fn issue_report_without_issues_has_header() {
        let mut out = Vec::new();
        write_issue_report(&mut out, "empty", &QualityScore::default(), &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("severity,type,component,line,message,effort,status,project_score\n"));
    }

    #[test]
    fn summary_upsert_replaces_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output/summary.csv");

        upsert_quality_summary(&path, "https://github.com/acme/web", 70.0).unwrap();
        upsert_quality_summary(&path, "https://github.com/acme/api", 55.126).unwrap();
        upsert_quality_summary(&path, "https://github.com/acme/web", 81.5).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "repo_url,score\n\
             https://github.com/acme/api,55.13\n\
             https://github.com/acme/web,81.50\n"
        );
    }

    #[test]
    fn summary_upsert_reads_columns_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        std::fs::write(&path, "score,repo_url\n42.00,https://github.com/acme/api\n").unwrap();

        upsert_quality_summary(&path, "https://github.com/acme/web", 60.0).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "repo_url,score\n\
             https://github.com/acme/api,42.00\n\
             https://github.com/acme/web,60.00\n"
        );
    }

    #[test]
    fn summary_without_url_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        std::fs::write(&path, "url,score\nhttps://github.com/acme/api,1\n").unwrap();

        let result = upsert_quality_summary(&path, "https://github.com/acme/web", 60.0);
        assert!(matches!(result, Err(PulseError::Config(_))));
    }
}
