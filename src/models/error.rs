//! Error types for starmail.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for starmail.
#[derive(Debug, Error)]
pub enum StarmailError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No data found in {0}")]
    NoData(PathBuf),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("GitHub API error: {0}")]
    Github(#[from] GithubError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// GitHub GraphQL API specific errors.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("Authentication failed: invalid or expired token")]
    AuthenticationFailed,

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error(
        "The GitHub token has reached its rate limit. Wait {reset_in_secs} seconds before \
         trying again or switch to a different token"
    )]
    RateLimited { reset_in_secs: i64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl StarmailError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if this error is a transient network fault worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

/// Result type alias for starmail.
pub type Result<T> = std::result::Result<T, StarmailError>;
