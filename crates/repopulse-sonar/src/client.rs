use std::collections::HashMap;

use repopulse_core::{PulseError, SonarConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::score::METRIC_KEYS;

/// A single SonarQube issue, reduced to the exported columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarIssue {
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub component: String,
    pub line: Option<u64>,
    pub message: String,
    pub effort: Option<String>,
    pub status: String,
}

#[derive(Deserialize)]
struct MeasuresResponse {
    #[serde(default)]
    component: MeasuredComponent,
}

#[derive(Default, Deserialize)]
struct MeasuredComponent {
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Deserialize)]
struct Measure {
    metric: String,
    value: Option<String>,
}

#[derive(Deserialize)]
struct IssuesResponse {
    #[serde(default)]
    issues: Vec<SonarIssue>,
}

/// SonarQube web API client authenticated with a user token.
///
/// # Examples
///
/// ```no_run
/// use repopulse_core::SonarConfig;
/// use repopulse_sonar::{QualityScore, SonarClient};
///
/// # async fn run() -> Result<(), repopulse_core::PulseError> {
/// let client = SonarClient::new(&SonarConfig::default())?;
/// let measures = client.fetch_measures("my-project").await?;
/// let score = QualityScore::from_measures(&measures);
/// println!("score = {:.2}", score.score);
/// # Ok(())
/// # }
/// ```
pub struct SonarClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    page_size: u32,
}

impl SonarClient {
    /// # Errors
    ///
    /// Returns [`PulseError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SonarConfig) -> Result<Self, PulseError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("repopulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PulseError::Http(format!("failed to create SonarQube client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.resolve_token(),
            page_size: config.page_size.clamp(1, 500),
        })
    }

    /// Replace the resolved token, e.g. with one given on the command line.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PulseError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            // SonarQube takes the token as the basic-auth user with no password
            request = request.basic_auth(token, None::<&str>);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PulseError::Http(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PulseError::Http(format!(
                "SonarQube API error {status} for {url}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| PulseError::Http(format!("unreadable response from {url}: {e}")))
    }

    /// Raw measure values for the scoring metrics, keyed by metric name.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Http`] on transport or API errors.
    pub async fn fetch_measures(
        &self,
        project_key: &str,
    ) -> Result<HashMap<String, String>, PulseError> {
        let response: MeasuresResponse = self
            .get_json(
                "/api/measures/component",
                &[
                    ("component", project_key.to_string()),
                    ("metricKeys", METRIC_KEYS.join(",")),
                ],
            )
            .await?;

        Ok(response
            .component
            .measures
            .into_iter()
            .filter_map(|m| Some((m.metric, m.value?)))
            .collect())
    }

    /// Every issue of the project, following pagination until a short page.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Http`] if any page cannot be fetched.
    pub async fn fetch_issues(&self, project_key: &str) -> Result<Vec<SonarIssue>, PulseError> {
        let mut issues = Vec::new();
        let mut page = 1u32;
        loop {
            let response: IssuesResponse = self
                .get_json(
                    "/api/issues/search",
                    &[
                        ("componentKeys", project_key.to_string()),
                        ("ps", self.page_size.to_string()),
                        ("p", page.to_string()),
                    ],
                )
                .await?;

            let fetched = response.issues.len();
            issues.extend(response.issues);
            debug!(project_key, page, total = issues.len(), "fetched issue page");
            if fetched < self.page_size as usize {
                break;
            }
            page += 1;
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_deserializes_with_missing_fields() {
        let issue: SonarIssue = serde_json::from_str(
            r#"{"severity":"MAJOR","type":"CODE_SMELL","component":"p:src/a.py","message":"Rename"}"#,
        )
        .unwrap();
        assert_eq!(issue.kind, "CODE_SMELL");
        assert_eq!(issue.line, None);
        assert_eq!(issue.effort, None);
        assert_eq!(issue.status, "");
    }

    #[test]
    fn measures_response_skips_valueless_metrics() {
        let response: MeasuresResponse = serde_json::from_str(
            r#"{"component":{"key":"p","measures":[{"metric":"sqale_rating","value":"1.0"},{"metric":"security_rating"}]}}"#,
        )
        .unwrap();
        let measures: HashMap<String, String> = response
            .component
            .measures
            .into_iter()
            .filter_map(|m| Some((m.metric, m.value?)))
            .collect();
        assert_eq!(measures.len(), 1);
        assert_eq!(measures["sqale_rating"], "1.0");
    }

    #[test]
    fn client_trims_base_url() {
        let config = SonarConfig {
            url: "http://localhost:9000/".into(),
            ..SonarConfig::default()
        };
        let client = SonarClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(client.page_size, 500);
    }
}
