use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Top-level configuration loaded from `.repopulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use repopulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.github.rate_limit_wait_secs, 300);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Dataset locations for every pipeline stage.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Source-control hosting API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// SonarQube server settings.
    #[serde(default)]
    pub sonar: SonarConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the file cannot be read, or
    /// [`PulseError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [github]
    /// request_delay_ms = 0
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.github.request_delay_ms, 0);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Where each stage reads and writes its datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Input list of repository URLs (`repo_url` column).
    #[serde(default = "default_repos_csv")]
    pub repos_csv: PathBuf,
    /// Contributor counts per repository.
    #[serde(default = "default_contributors_csv")]
    pub contributors_csv: PathBuf,
    /// Activity group assignment per repository.
    #[serde(default = "default_groups_csv")]
    pub groups_csv: PathBuf,
    /// Raw first-line commit messages per repository.
    #[serde(default = "default_raw_commits_json")]
    pub raw_commits_json: PathBuf,
    /// Commit category counts per repository.
    #[serde(default = "default_commit_types_csv")]
    pub commit_types_csv: PathBuf,
    /// Commit messages no keyword matched.
    #[serde(default = "default_unclassified_json")]
    pub unclassified_json: PathBuf,
    /// One quality score per repository URL.
    #[serde(default = "default_quality_summary_csv")]
    pub quality_summary_csv: PathBuf,
}

fn default_repos_csv() -> PathBuf {
    PathBuf::from("repos_url.csv")
}

fn default_contributors_csv() -> PathBuf {
    PathBuf::from("data/contributors.csv")
}

fn default_groups_csv() -> PathBuf {
    PathBuf::from("data/repos_groups.csv")
}

fn default_raw_commits_json() -> PathBuf {
    PathBuf::from("data/raw_commits_data.json")
}

fn default_commit_types_csv() -> PathBuf {
    PathBuf::from("data/commits_types.csv")
}

fn default_unclassified_json() -> PathBuf {
    PathBuf::from("data/commits_unclassified.json")
}

fn default_quality_summary_csv() -> PathBuf {
    PathBuf::from("sonar/output/summary.csv")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repos_csv: default_repos_csv(),
            contributors_csv: default_contributors_csv(),
            groups_csv: default_groups_csv(),
            raw_commits_json: default_raw_commits_json(),
            commit_types_csv: default_commit_types_csv(),
            unclassified_json: default_unclassified_json(),
            quality_summary_csv: default_quality_summary_csv(),
        }
    }
}

/// GitHub REST API configuration.
///
/// # Examples
///
/// ```
/// use repopulse_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.api_base, "https://api.github.com");
/// assert_eq!(config.commits_per_page, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Personal access token. Falls back to `GITHUB_TOKEN` / `GH_TOKEN`.
    pub token: Option<String>,
    /// Seconds to wait after a 403 rate-limit response (default: 300).
    #[serde(default = "default_rate_limit_wait_secs")]
    pub rate_limit_wait_secs: u64,
    /// Rate-limit retries per request before giving up (default: 10).
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    /// Pause between consecutive repositories or pages (default: 500).
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Per-request timeout (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Page size for commit listing (default: 100, the API maximum).
    #[serde(default = "default_commits_per_page")]
    pub commits_per_page: u32,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

fn default_rate_limit_wait_secs() -> u64 {
    300
}

fn default_max_rate_limit_retries() -> u32 {
    10
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_commits_per_page() -> u32 {
    100
}

impl GitHubConfig {
    /// Token from config, then `GITHUB_TOKEN`, then `GH_TOKEN`.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            rate_limit_wait_secs: default_rate_limit_wait_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            commits_per_page: default_commits_per_page(),
        }
    }
}

/// SonarQube server configuration.
///
/// # Examples
///
/// ```
/// use repopulse_core::SonarConfig;
///
/// let config = SonarConfig::default();
/// assert_eq!(config.url, "http://sonarqube-server:9000");
/// assert_eq!(config.page_size, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonarConfig {
    /// Server root URL.
    #[serde(default = "default_sonar_url")]
    pub url: String,
    /// User token. Falls back to `SONAR_TOKEN`.
    pub token: Option<String>,
    /// Issues per page (default: 500, the server maximum).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_sonar_url() -> String {
    "http://sonarqube-server:9000".into()
}

fn default_page_size() -> u32 {
    500
}

impl SonarConfig {
    /// Token from config, then `SONAR_TOKEN`.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("SONAR_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            url: default_sonar_url(),
            token: None,
            page_size: default_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PulseConfig::default();
        assert_eq!(config.paths.repos_csv, PathBuf::from("repos_url.csv"));
        assert_eq!(
            config.paths.contributors_csv,
            PathBuf::from("data/contributors.csv")
        );
        assert_eq!(config.paths.groups_csv, PathBuf::from("data/repos_groups.csv"));
        assert_eq!(config.github.rate_limit_wait_secs, 300);
        assert_eq!(config.github.max_rate_limit_retries, 10);
        assert_eq!(config.github.request_delay_ms, 500);
        assert!(config.github.token.is_none());
        assert_eq!(config.sonar.page_size, 500);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PulseConfig::from_toml("").unwrap();
        assert_eq!(config.github.commits_per_page, 100);
        assert_eq!(config.sonar.url, "http://sonarqube-server:9000");
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
[paths]
contributors_csv = "out/contributors.csv"

[github]
rate_limit_wait_secs = 60
token = "ghp_test"

[sonar]
url = "http://localhost:9000"
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(
            config.paths.contributors_csv,
            PathBuf::from("out/contributors.csv")
        );
        assert_eq!(config.paths.groups_csv, PathBuf::from("data/repos_groups.csv"));
        assert_eq!(config.github.rate_limit_wait_secs, 60);
        assert_eq!(config.github.resolve_token().as_deref(), Some("ghp_test"));
        assert_eq!(config.sonar.url, "http://localhost:9000");
        assert_eq!(config.sonar.page_size, 500);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = PulseConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(PulseError::Toml(_))));
    }

    #[test]
    fn blank_configured_token_is_ignored() {
        let config = SonarConfig {
            token: Some("   ".into()),
            ..SonarConfig::default()
        };
        assert!(config.resolve_token().is_none());
    }
}
