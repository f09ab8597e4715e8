use std::path::PathBuf;

use miette::Diagnostic;

/// Errors that can occur across the repopulse pipeline.
///
/// Library crates return this type directly; the binary turns it into a
/// `miette::Report` at the boundary so diagnostics keep their code and help.
///
/// # Examples
///
/// ```
/// use repopulse_core::PulseError;
///
/// let err = PulseError::Config("missing token".into());
/// assert!(err.to_string().contains("missing token"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(repopulse::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(repopulse::config))]
    Config(String),

    /// Malformed CSV that the reader could not recover from.
    #[error("CSV error: {0}")]
    #[diagnostic(code(repopulse::csv))]
    Csv(#[from] csv::Error),

    /// REST API transport or status failure.
    #[error("HTTP error: {0}")]
    #[diagnostic(code(repopulse::http))]
    Http(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(repopulse::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(repopulse::toml))]
    Toml(#[from] toml::de::Error),

    /// A required input dataset was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(
        code(repopulse::file_not_found),
        help("run the upstream stage first, or point the flag at an existing file")
    )]
    FileNotFound(PathBuf),

    /// A repository URL without an `owner/name` tail.
    #[error("invalid repository URL '{0}', expected https://host/owner/name")]
    #[diagnostic(code(repopulse::repo_url))]
    InvalidRepoUrl(String),
}
