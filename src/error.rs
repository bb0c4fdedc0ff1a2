//! Error types for the clause-review crate.
//!
//! Only collaborator calls (parse, analyze, refine, export) and persistence
//! I/O can fail. State transitions are total and never produce these.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Review-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The uploaded file type has no parser.
    #[error("unsupported file type: {file_type}")]
    UnsupportedFormat { file_type: String },

    /// The parser recognised the format but could not extract text.
    #[error("failed to parse {file_name}: {reason}")]
    ParseFailure { file_name: String, reason: String },

    /// The analysis/refinement provider has no credentials configured.
    #[error("analysis provider not configured: provide an API key first")]
    NotConfigured,

    /// The provider rejected the configured credential.
    #[error("invalid API key: check the provider credential")]
    InvalidCredential,

    /// The provider refused the request because a quota or rate limit was hit.
    #[error("API quota exceeded: try again later")]
    QuotaExceeded,

    /// Any other analysis or refinement failure.
    #[error("analysis failed: {0}")]
    AnalysisFailure(String),

    /// I/O error with context.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

static CREDENTIAL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bapi[ _-]?key\b|unauthori[sz]ed|permission denied").ok());

static QUOTA_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)quota|rate[ _-]?limit|resource[ _-]?exhausted").ok());

impl ReviewError {
    /// Map a provider's free-text failure message onto the error taxonomy.
    pub fn classify(message: &str) -> Self {
        let matches = |pattern: &LazyLock<Option<Regex>>| {
            pattern.as_ref().is_some_and(|re| re.is_match(message))
        };

        if matches(&CREDENTIAL_PATTERN) {
            Self::InvalidCredential
        } else if matches(&QUOTA_PATTERN) {
            Self::QuotaExceeded
        } else {
            Self::AnalysisFailure(message.to_owned())
        }
    }

    /// True for failures that came from a collaborator rather than local I/O.
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured
                | Self::InvalidCredential
                | Self::QuotaExceeded
                | Self::AnalysisFailure(_)
        )
    }
}

/// Convenience result type for clause-review operations.
pub type ReviewResult<T> = Result<T, ReviewError>;
