use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One repository and how many people have contributed to it.
///
/// # Examples
///
/// ```
/// use repopulse_core::ContributorRecord;
///
/// let record = ContributorRecord::new("api-server", 12);
/// assert_eq!(record.repo, "api-server");
/// assert_eq!(record.contributors, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    /// Repository identifier, unique within a run.
    pub repo: String,
    /// Number of distinct contributors.
    pub contributors: u64,
}

impl ContributorRecord {
    pub fn new(repo: impl Into<String>, contributors: u64) -> Self {
        Self {
            repo: repo.into(),
            contributors,
        }
    }
}

/// Activity tier derived from contributor count.
///
/// Persisted as its integer value: `1` is the lowest activity, `3` the highest.
///
/// # Examples
///
/// ```
/// use repopulse_core::ActivityGroup;
///
/// assert_eq!(ActivityGroup::Medium.number(), 2);
/// assert_eq!(ActivityGroup::High.to_string(), "3");
/// assert!(ActivityGroup::Low < ActivityGroup::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActivityGroup {
    /// Group 1: the smallest contributor counts.
    Low,
    /// Group 2.
    Medium,
    /// Group 3: the largest contributor counts.
    High,
}

impl ActivityGroup {
    /// All groups in ascending order.
    pub const ALL: [ActivityGroup; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn number(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for ActivityGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for ActivityGroup {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Self::from_number(n)
            .ok_or_else(|| serde::de::Error::custom(format!("group must be 1, 2 or 3, got {n}")))
    }
}

/// The group a single repository was assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAssignment {
    /// Repository identifier.
    pub repo: String,
    /// Assigned activity group.
    pub group: ActivityGroup,
}

/// Raw commit history collected for one repository.
///
/// # Examples
///
/// ```
/// use repopulse_core::RepoCommits;
///
/// let commits = RepoCommits {
///     repo: "api-server".into(),
///     owner: "acme".into(),
///     commits: vec!["fix: handle empty body".into()],
/// };
/// assert_eq!(commits.commits.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCommits {
    /// Repository name.
    pub repo: String,
    /// Owning user or organization.
    pub owner: String,
    /// First line of each commit message, newest first.
    #[serde(default)]
    pub commits: Vec<String>,
}

/// Commit histories keyed by repository name.
pub type RawCommitData = BTreeMap<String, RepoCommits>;

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use repopulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
