use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use repopulse_core::{GitHubConfig, PulseError};
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::repos::RepoRef;

static LAST_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[?&]page=(\d+)[^>]*>;\s*rel="last""#).expect("static regex")
});

/// GitHub REST client for contributor counts and commit listings.
///
/// Requests are issued one at a time. A `403` or `429` response is treated
/// as rate limiting: the client sleeps for the configured wait and retries
/// the same request.
///
/// # Examples
///
/// ```no_run
/// use repopulse_core::GitHubConfig;
/// use repopulse_github::{repos::parse_repo_url, GitHubClient};
///
/// # async fn run() -> Result<(), repopulse_core::PulseError> {
/// let client = GitHubClient::new(&GitHubConfig::default())?;
/// let repo = parse_repo_url("https://github.com/rust-lang/cargo")?;
/// let count = client.contributor_count(&repo).await?;
/// println!("{} has {count} contributors", repo.name);
/// # Ok(())
/// # }
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    rate_limit_wait: Duration,
    max_rate_limit_retries: u32,
    request_delay: Duration,
    per_page: u32,
}

#[derive(Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
}

impl GitHubClient {
    /// Build a client from configuration. The token is resolved from the
    /// config, then `GITHUB_TOKEN`, then `GH_TOKEN`; without one, requests
    /// are anonymous and heavily rate limited.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, PulseError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("repopulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PulseError::Http(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.resolve_token(),
            rate_limit_wait: Duration::from_secs(config.rate_limit_wait_secs),
            max_rate_limit_retries: config.max_rate_limit_retries,
            request_delay: Duration::from_millis(config.request_delay_ms),
            per_page: config.commits_per_page.clamp(1, 100),
        })
    }

    /// Replace the resolved token, e.g. with one given on the command line.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Pause inserted between consecutive repositories and pages.
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, PulseError> {
        let mut retries = 0u32;
        loop {
            let mut request = self
                .http
                .get(url)
                .query(query)
                .header(ACCEPT, "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }

            let response = request
                .send()
                .await
                .map_err(|e| PulseError::Http(format!("request to {url} failed: {e}")))?;

            let status = response.status();
            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.max_rate_limit_retries {
                    return Err(PulseError::Http(format!(
                        "still rate limited after {retries} retries: {url}"
                    )));
                }
                retries += 1;
                warn!(
                    url,
                    wait_secs = self.rate_limit_wait.as_secs(),
                    retry = retries,
                    "rate limited, waiting before retry"
                );
                tokio::time::sleep(self.rate_limit_wait).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PulseError::Http(format!(
                    "GitHub API error {status} for {url}: {body}"
                )));
            }

            return Ok(response);
        }
    }

    /// Number of contributors to `repo`, anonymous contributors included.
    ///
    /// Requests one contributor per page and reads the page count from the
    /// `Link` header; a repository with a single page of results is counted
    /// from the response body instead.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Http`] on transport errors, non-success status,
    /// or exhausted rate-limit retries, and [`PulseError::Serialization`] if
    /// the body is not a JSON array.
    pub async fn contributor_count(&self, repo: &RepoRef) -> Result<u64, PulseError> {
        let url = format!(
            "{}/repos/{}/{}/contributors",
            self.api_base, repo.owner, repo.name
        );
        let response = self
            .get(&url, &[("per_page", "1".into()), ("anon", "true".into())])
            .await?;

        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_last_page);
        if let Some(pages) = last_page {
            return Ok(pages);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PulseError::Http(format!("failed to read {url}: {e}")))?;
        if body.trim().is_empty() {
            // 204 No Content for repositories without history
            return Ok(0);
        }
        let entries: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        Ok(entries.len() as u64)
    }

    /// First line of every commit message on the default branch, newest first.
    ///
    /// Pages through the commit list until a short or empty page. A failure
    /// part-way through ends collection and keeps what was gathered.
    pub async fn commit_messages(&self, repo: &RepoRef) -> Vec<String> {
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.api_base, repo.owner, repo.name
        );

        let mut messages = Vec::new();
        let mut page = 1u32;
        loop {
            let query = [
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ];
            let response = match self.get(&url, &query).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(repo = %repo.name, page, error = %e, "stopping commit collection");
                    break;
                }
            };
            let entries: Vec<CommitEntry> = match response.json().await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(repo = %repo.name, page, error = %e, "unreadable commit page");
                    break;
                }
            };
            if entries.is_empty() {
                break;
            }

            let fetched = entries.len();
            messages.extend(
                entries
                    .into_iter()
                    .map(|entry| first_line(&entry.commit.message).to_string()),
            );
            debug!(repo = %repo.name, page, total = messages.len(), "fetched commit page");

            if fetched < self.per_page as usize {
                break;
            }
            page += 1;
            tokio::time::sleep(self.request_delay).await;
        }

        messages
    }
}

/// Page number of the `rel="last"` entry of a `Link` header.
///
/// # Examples
///
/// ```
/// use repopulse_github::client::parse_last_page;
///
/// let link = r#"<https://api.github.com/repositories/1/contributors?per_page=1&anon=true&page=2>; rel="next", <https://api.github.com/repositories/1/contributors?per_page=1&anon=true&page=57>; rel="last""#;
/// assert_eq!(parse_last_page(link), Some(57));
/// assert_eq!(parse_last_page(r#"<https://x/?page=1>; rel="prev""#), None);
/// ```
pub fn parse_last_page(link: &str) -> Option<u64> {
    LAST_PAGE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_from_full_link_header() {
        let link = r#"<https://api.github.com/repos/acme/api/contributors?per_page=1&anon=true&page=2>; rel="next", <https://api.github.com/repos/acme/api/contributors?per_page=1&anon=true&page=34>; rel="last""#;
        assert_eq!(parse_last_page(link), Some(34));
    }

    #[test]
    fn last_page_when_page_is_not_final_parameter() {
        let link = r#"<https://api.github.com/repos/acme/api/contributors?page=12&per_page=1>; rel="last""#;
        assert_eq!(parse_last_page(link), Some(12));
    }

    #[test]
    fn per_page_is_not_mistaken_for_page() {
        let link = r#"<https://api.github.com/repos/acme/api/contributors?per_page=1>; rel="last""#;
        assert_eq!(parse_last_page(link), None);
    }

    #[test]
    fn no_last_relation_gives_none() {
        let link = r#"<https://api.github.com/repos/acme/api/contributors?per_page=1&page=1>; rel="first""#;
        assert_eq!(parse_last_page(link), None);
        assert_eq!(parse_last_page(""), None);
    }

    #[test]
    fn first_line_of_multiline_message() {
        assert_eq!(first_line("feat: add parser\n\nLong body"), "feat: add parser");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn client_uses_configured_token() {
        let config = GitHubConfig {
            token: Some("ghp_test".into()),
            api_base: "https://ghe.example.com/api/v3/".into(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config).unwrap();
        assert!(client.is_authenticated());
        assert_eq!(client.api_base, "https://ghe.example.com/api/v3");
        assert_eq!(client.request_delay(), Duration::from_millis(500));
    }

    #[test]
    fn explicit_token_overrides_config() {
        let client = GitHubClient::new(&GitHubConfig::default())
            .unwrap()
            .with_token(Some("ghp_cli".into()));
        assert_eq!(client.token.as_deref(), Some("ghp_cli"));
    }
}
