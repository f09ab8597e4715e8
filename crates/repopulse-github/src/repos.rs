//! Repository list parsing.

use std::path::Path;

use repopulse_core::PulseError;
use tracing::{debug, warn};

/// A repository on the hosting service.
///
/// # Examples
///
/// ```
/// use repopulse_github::repos::parse_repo_url;
///
/// let repo = parse_repo_url("https://github.com/rust-lang/cargo/").unwrap();
/// assert_eq!(repo.owner, "rust-lang");
/// assert_eq!(repo.name, "cargo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Owning user or organization.
    pub owner: String,
    /// Repository name; used as the repository id downstream.
    pub name: String,
    /// URL as given in the input list.
    pub url: String,
}

/// Split a repository URL into owner and name.
///
/// Accepts `https://host/owner/name`, with or without a trailing slash or
/// `.git` suffix, as well as a bare `owner/name`. Deeper URLs use their last
/// two path segments.
///
/// # Errors
///
/// Returns [`PulseError::InvalidRepoUrl`] if fewer than two path segments
/// follow the host.
pub fn parse_repo_url(url: &str) -> Result<RepoRef, PulseError> {
    let trimmed = url.trim();
    let path = match trimmed.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => trimmed,
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let [.., owner, name] = segments.as_slice() else {
        return Err(PulseError::InvalidRepoUrl(trimmed.to_string()));
    };
    let name = name.strip_suffix(".git").unwrap_or(*name);
    if name.is_empty() {
        return Err(PulseError::InvalidRepoUrl(trimmed.to_string()));
    }

    Ok(RepoRef {
        owner: (*owner).to_string(),
        name: name.to_string(),
        url: trimmed.to_string(),
    })
}

/// Read repositories from a CSV file with a `repo_url` column.
///
/// Blank URLs are ignored; URLs that cannot be parsed are skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
/// [`PulseError::Config`] if the header has no `repo_url` column.
pub fn read_repo_list(path: &Path) -> Result<Vec<RepoRef>, PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let url_col = reader
        .headers()?
        .iter()
        .position(|h| h == "repo_url")
        .ok_or_else(|| {
            PulseError::Config(format!("{} has no 'repo_url' column", path.display()))
        })?;

    let mut repos = Vec::new();
    for result in reader.records() {
        let record = result?;
        let url = record.get(url_col).unwrap_or_default();
        if url.is_empty() {
            continue;
        }
        match parse_repo_url(url) {
            Ok(repo) => repos.push(repo),
            Err(e) => warn!(url, error = %e, "skipping repository"),
        }
    }

    debug!(path = %path.display(), repos = repos.len(), "read repository list");
    Ok(repos)
}
