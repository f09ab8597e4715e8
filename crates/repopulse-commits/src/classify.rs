use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse category of a commit, judged from its message.
///
/// # Examples
///
/// ```
/// use repopulse_commits::CommitCategory;
///
/// assert_eq!(CommitCategory::Refactor.to_string(), "refactor");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitCategory {
    Feat,
    Fix,
    Refactor,
    Ci,
    Chore,
    /// No keyword matched.
    Other,
}

impl CommitCategory {
    /// Every category, in column order.
    pub const ALL: [CommitCategory; 6] = [
        Self::Feat,
        Self::Fix,
        Self::Refactor,
        Self::Ci,
        Self::Chore,
        Self::Other,
    ];
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitCategory::Feat => "feat",
            CommitCategory::Fix => "fix",
            CommitCategory::Refactor => "refactor",
            CommitCategory::Ci => "ci",
            CommitCategory::Chore => "chore",
            CommitCategory::Other => "other",
        };
        f.write_str(name)
    }
}

// Checked in order; the first category with a matching keyword wins.
const KEYWORDS: [(CommitCategory, &[&str]); 5] = [
    (
        CommitCategory::Feat,
        &["feat", "feature", "add", "implement", "new"],
    ),
    (
        CommitCategory::Fix,
        &["fix", "bug", "error", "issue", "patch", "hotfix"],
    ),
    (
        CommitCategory::Refactor,
        &["refactor", "cleanup", "rework", "rewrite", "simplify"],
    ),
    (
        CommitCategory::Ci,
        &["ci", "pipeline", "workflow", "docker", "build"],
    ),
    (
        CommitCategory::Chore,
        &["chore", "deps", "dependency", "bump", "version", "format", "lint"],
    ),
];

/// Keyword-based commit classifier.
///
/// Matching is case-insensitive and on whole words, so `"fixes"` does not
/// count as `fix` but `"Fix(parser): ..."` does.
///
/// # Examples
///
/// ```
/// use repopulse_commits::{CommitCategory, CommitClassifier};
///
/// let classifier = CommitClassifier::new();
/// assert_eq!(classifier.classify("Add OAuth login"), CommitCategory::Feat);
/// assert_eq!(classifier.classify("bump serde to 1.0.200"), CommitCategory::Chore);
/// assert_eq!(classifier.classify("Update README"), CommitCategory::Other);
/// ```
pub struct CommitClassifier {
    patterns: Vec<(CommitCategory, Regex)>,
}

impl CommitClassifier {
    pub fn new() -> Self {
        let patterns = KEYWORDS
            .iter()
            .map(|(category, words)| {
                let pattern = format!(r"(?i)\b({})\b", words.join("|"));
                (
                    *category,
                    Regex::new(&pattern).expect("keyword patterns are valid regex"),
                )
            })
            .collect();
        Self { patterns }
    }

    pub fn classify(&self, message: &str) -> CommitCategory {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(message))
            .map_or(CommitCategory::Other, |(category, _)| *category)
    }
}

impl Default for CommitClassifier {
    fn default() -> Self {
        Self::new()
    }
}
