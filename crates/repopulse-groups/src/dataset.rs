//! CSV datasets consumed and produced by the grouping stage.
//!
//! Contributor counts are read positionally (first column id, second column
//! count) and recovered softly: a malformed count becomes `0` and the record
//! is kept. Group assignments are written with a fixed header and one row per
//! repository.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use repopulse_core::{ActivityGroup, ContributorRecord, GroupAssignment, PulseError};
use serde::Deserialize;
use tracing::{debug, warn};

/// Header of the assignment dataset.
pub const ASSIGNMENT_HEADER: [&str; 2] = ["repo_name", "repo_group"];

/// Header of the contributor dataset.
pub const CONTRIBUTOR_HEADER: [&str; 2] = ["repo", "contributors"];

/// Read contributor counts from a CSV file with a header row.
///
/// Extra columns are ignored and short rows are tolerated. Rows without a
/// repository id are skipped.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Csv`] on an unrecoverable read failure.
pub fn read_contributors(path: &Path) -> Result<Vec<ContributorRecord>, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    // Byte records, so a count that is not UTF-8 still falls back to 0
    for (row, result) in reader.byte_records().enumerate() {
        let line = row + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable contributor row");
                continue;
            }
        };

        let repo = String::from_utf8_lossy(record.get(0).unwrap_or_default());
        // An empty id cannot be joined against scores or commits downstream,
        // and every such row would collapse onto the same key.
        if repo.is_empty() {
            warn!(line, "skipping contributor row without repository id");
            continue;
        }

        let contributors = parse_count(record.get(1), &repo);
        records.push(ContributorRecord::new(repo, contributors));
    }

    debug!(path = %path.display(), records = records.len(), "read contributor dataset");
    Ok(records)
}

fn parse_count(field: Option<&[u8]>, repo: &str) -> u64 {
    let Some(bytes) = field else {
        warn!(repo, "missing contributor count, using 0");
        return 0;
    };
    match std::str::from_utf8(bytes).ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(count) => count,
        None => {
            warn!(repo, value = %String::from_utf8_lossy(bytes), "non-integer contributor count, using 0");
            0
        }
    }
}

/// Write contributor counts, one row per record, in the given order.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Csv`] if the file cannot be written.
pub fn write_contributors(path: &Path, records: &[ContributorRecord]) -> Result<(), PulseError> {
    let mut writer = csv::Writer::from_writer(create_with_parents(path)?);
    writer.write_record(CONTRIBUTOR_HEADER)?;
    for record in records {
        let count = record.contributors.to_string();
        writer.write_record([record.repo.as_str(), count.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize assignments as CSV into `writer`.
///
/// The header is always written, so an empty slice produces a header-only
/// dataset.
///
/// # Examples
///
/// ```
/// use repopulse_core::{ActivityGroup, GroupAssignment};
/// use repopulse_groups::dataset::write_assignments;
///
/// let mut out = Vec::new();
/// let rows = vec![GroupAssignment { repo: "site".into(), group: ActivityGroup::Medium }];
/// write_assignments(&mut out, &rows).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "repo_name,repo_group\nsite,2\n");
/// ```
pub fn write_assignments<W: Write>(
    writer: W,
    assignments: &[GroupAssignment],
) -> Result<(), PulseError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(ASSIGNMENT_HEADER)?;
    for assignment in assignments {
        let group = assignment.group.to_string();
        writer.write_record([assignment.repo.as_str(), group.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write assignments to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Csv`] if the file cannot be written.
pub fn write_assignments_file(
    path: &Path,
    assignments: &[GroupAssignment],
) -> Result<(), PulseError> {
    write_assignments(create_with_parents(path)?, assignments)
}

#[derive(Deserialize)]
struct AssignmentRow {
    repo_name: String,
    repo_group: String,
}

/// Read a previously written assignment dataset.
///
/// Rows whose group is not 1, 2 or 3 are skipped.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Csv`] if the header is missing the expected columns.
pub fn read_assignments(path: &Path) -> Result<Vec<GroupAssignment>, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut assignments = Vec::new();
    for result in reader.deserialize::<AssignmentRow>() {
        let row = result?;
        let group = row
            .repo_group
            .parse::<u8>()
            .ok()
            .and_then(ActivityGroup::from_number);
        match group {
            Some(group) => assignments.push(GroupAssignment {
                repo: row.repo_name,
                group,
            }),
            None => warn!(
                repo = %row.repo_name,
                value = %row.repo_group,
                "skipping assignment with invalid group"
            ),
        }
    }
    Ok(assignments)
}

pub(crate) fn create_with_parents(path: &Path) -> Result<File, PulseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}
