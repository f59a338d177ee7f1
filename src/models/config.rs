//! Configuration models for starmail.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for starmail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API configuration
    #[serde(default)]
    pub github: GithubConfig,

    /// Converter defaults
    #[serde(default)]
    pub convert: ConvertConfig,
}

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Token (can also be set via the `token_env` environment variable)
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable name for the token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// GraphQL endpoint URL
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient network faults
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Stargazers requested per page (GitHub caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_page_size() -> u32 {
    100
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            graphql_url: default_graphql_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            page_size: default_page_size(),
        }
    }
}

/// Converter defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// CSV field delimiter (must be a single byte)
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Whether the CSV output includes a header row
    #[serde(default = "default_true")]
    pub include_headers: bool,

    /// Worksheet name for XLSX output
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}

fn default_sheet_name() -> String {
    "Contacts".to_string()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            include_headers: default_true(),
            sheet_name: default_sheet_name(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the GitHub token from config or environment.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = &self.github.token {
            return Ok(token.clone());
        }

        std::env::var(&self.github.token_env).map_err(|_| ConfigError::MissingToken {
            env_var: self.github.token_env.clone(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing GitHub token: set {env_var} or token in the [github] config section")]
    MissingToken { env_var: String },
}
