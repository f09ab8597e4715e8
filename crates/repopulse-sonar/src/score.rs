//! Weighted quality score from SonarQube measures.

use std::collections::HashMap;

use serde::Serialize;

/// Metric keys requested from the measures endpoint.
pub const METRIC_KEYS: [&str; 5] = [
    "reliability_rating",
    "sqale_rating",
    "security_rating",
    "duplicated_lines_density",
    "cognitive_complexity",
];

const RELIABILITY_WEIGHT: f64 = 0.25;
const MAINTAINABILITY_WEIGHT: f64 = 0.20;
const SECURITY_WEIGHT: f64 = 0.15;
const DUPLICATION_WEIGHT: f64 = 0.20;
const COMPLEXITY_WEIGHT: f64 = 0.20;

/// Map a SonarQube rating to points.
///
/// Ratings arrive either as letters `A`..`E` or as numbers `1.0`..`5.0`;
/// both map to 100, 80, 60, 40, 20. Anything else scores 0.
///
/// # Examples
///
/// ```
/// use repopulse_sonar::score::rating_to_score;
///
/// assert_eq!(rating_to_score("1.0"), 100);
/// assert_eq!(rating_to_score("c"), 60);
/// assert_eq!(rating_to_score("9"), 0);
/// ```
pub fn rating_to_score(value: &str) -> u32 {
    let value = value.trim().to_uppercase();
    match value.as_str() {
        "A" => return 100,
        "B" => return 80,
        "C" => return 60,
        "D" => return 40,
        "E" => return 20,
        _ => {}
    }
    match value.parse::<f64>().map(f64::trunc) {
        Ok(n) if n == 1.0 => 100,
        Ok(n) if n == 2.0 => 80,
        Ok(n) if n == 3.0 => 60,
        Ok(n) if n == 4.0 => 40,
        Ok(n) if n == 5.0 => 20,
        _ => 0,
    }
}

fn clamp_percent(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

/// Component scores and their weighted total, each in `[0, 100]`.
///
/// `score = 0.25·reliability + 0.20·maintainability + 0.15·security
/// + 0.20·duplication + 0.20·complexity`.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use repopulse_sonar::QualityScore;
///
/// let measures: HashMap<String, String> = [
///     ("reliability_rating", "1.0"),
///     ("sqale_rating", "1.0"),
///     ("security_rating", "1.0"),
///     ("duplicated_lines_density", "0.0"),
///     ("cognitive_complexity", "0"),
/// ]
/// .into_iter()
/// .map(|(k, v)| (k.to_string(), v.to_string()))
/// .collect();
/// assert_eq!(QualityScore::from_measures(&measures).score, 100.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub reliability: f64,
    pub maintainability: f64,
    pub security: f64,
    /// `100 - duplicated_lines_density`.
    pub duplication: f64,
    /// `100 - cognitive_complexity`.
    pub complexity: f64,
    pub score: f64,
}

impl QualityScore {
    /// Score a project from its raw measure values keyed by metric.
    ///
    /// Missing or unparsable measures count as the worst rating (0 points) or
    /// as a zero density/complexity, whichever the metric is.
    pub fn from_measures(measures: &HashMap<String, String>) -> Self {
        let rating = |key: &str| measures.get(key).map_or(0, |v| rating_to_score(v)) as f64;
        let number = |key: &str| {
            measures
                .get(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };

        let reliability = rating("reliability_rating");
        let maintainability = rating("sqale_rating");
        let security = rating("security_rating");
        let duplication = (100.0 - number("duplicated_lines_density")).max(0.0);
        let complexity = (100.0 - number("cognitive_complexity")).max(0.0);

        let score = RELIABILITY_WEIGHT * reliability
            + MAINTAINABILITY_WEIGHT * maintainability
            + SECURITY_WEIGHT * security
            + DUPLICATION_WEIGHT * duplication
            + COMPLEXITY_WEIGHT * complexity;

        Self {
            reliability,
            maintainability,
            security,
            duplication: clamp_percent(duplication),
            complexity: clamp_percent(complexity),
            score: clamp_percent(score),
        }
    }
}
