//! Sequential collection loops over a repository list.

use std::path::Path;

use indicatif::ProgressBar;
use repopulse_core::{ContributorRecord, PulseError, RawCommitData, RepoCommits};
use tracing::{info, warn};

use crate::client::GitHubClient;
use crate::repos::RepoRef;

/// Fetch the contributor count of every repository, in input order.
///
/// A repository whose count cannot be fetched is recorded with `0` so one
/// failure never drops it from the dataset.
pub async fn collect_contributors(
    client: &GitHubClient,
    repos: &[RepoRef],
    progress: &ProgressBar,
) -> Vec<ContributorRecord> {
    let mut records = Vec::with_capacity(repos.len());
    for (i, repo) in repos.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(client.request_delay()).await;
        }
        progress.set_message(repo.name.clone());

        let contributors = match client.contributor_count(repo).await {
            Ok(count) => {
                info!(repo = %repo.name, contributors = count, "fetched contributors");
                count
            }
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "contributor count unavailable, using 0");
                0
            }
        };
        records.push(ContributorRecord::new(repo.name.clone(), contributors));
        progress.inc(1);
    }
    progress.finish_and_clear();
    records
}

/// Gather first-line commit messages for every repository.
pub async fn collect_commits(
    client: &GitHubClient,
    repos: &[RepoRef],
    progress: &ProgressBar,
) -> RawCommitData {
    let mut data = RawCommitData::new();
    for repo in repos {
        progress.set_message(repo.name.clone());
        let commits = client.commit_messages(repo).await;
        info!(repo = %repo.name, commits = commits.len(), "collected commits");
        data.insert(
            repo.name.clone(),
            RepoCommits {
                repo: repo.name.clone(),
                owner: repo.owner.clone(),
                commits,
            },
        );
        progress.inc(1);
    }
    progress.finish_and_clear();
    data
}

/// Persist collected commits as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PulseError::Io`] or [`PulseError::Serialization`] on failure.
pub fn write_raw_commits(path: &Path, data: &RawCommitData) -> Result<(), PulseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_commits_written_as_keyed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/raw_commits_data.json");

        let mut data = RawCommitData::new();
        data.insert(
            "api".into(),
            RepoCommits {
                repo: "api".into(),
                owner: "acme".into(),
                commits: vec!["fix: crash".into(), "feat: login".into()],
            },
        );
        write_raw_commits(&path, &data).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["api"]["owner"], "acme");
        assert_eq!(value["api"]["commits"][1], "feat: login");
    }

    #[tokio::test]
    async fn empty_repo_list_collects_nothing() {
        let client = GitHubClient::new(&repopulse_core::GitHubConfig::default()).unwrap();
        let progress = ProgressBar::hidden();
        assert!(collect_contributors(&client, &[], &progress).await.is_empty());
        assert!(collect_commits(&client, &[], &progress).await.is_empty());
    }
}
