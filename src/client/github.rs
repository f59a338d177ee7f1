//! GitHub GraphQL API client for the stargazers connection.
//!
//! One fixed query, serial cursor pagination. Transient network faults are
//! retried a bounded number of times with exponential backoff; rate limits
//! are fatal with an actionable wait-time message; everything else fails
//! fast with the original message.

use crate::fetch::PageSource;
use crate::models::{
    GithubConfig, GithubError, Result, StargazerNode, StargazerPage, StarmailError,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const STARGAZER_QUERY: &str = r#"
query ($owner: String!, $repo: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    stargazers(first: $first, after: $after) {
      totalCount
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        name
        login
        email
      }
    }
  }
}"#;

/// GraphQL response envelope. GitHub surfaces errors either as a non-2xx
/// status or as an `errors` array inside an otherwise-200 body.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlErrorBody>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    stargazers: StargazerConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StargazerConnection {
    total_count: u64,
    page_info: PageInfo,
    nodes: Vec<StargazerNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// GitHub GraphQL client with bounded retry and rate-limit detection.
pub struct GithubClient {
    client: reqwest::Client,
    token: String,
    graphql_url: String,
    max_retries: u32,
    page_size: u32,
}

impl GithubClient {
    /// Create a new client from configuration.
    pub fn new(token: String, config: &GithubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("starmail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StarmailError::Network)?;

        Ok(Self {
            client,
            token,
            graphql_url: config.graphql_url.clone(),
            max_retries: config.max_retries.max(1),
            page_size: config.page_size,
        })
    }

    /// Build headers for a request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| StarmailError::InvalidInput("token contains invalid bytes".into()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Issue one page request without retry handling.
    async fn execute(&self, owner: &str, repo: &str, after: Option<&str>) -> Result<StargazerPage> {
        let body = json!({
            "query": STARGAZER_QUERY,
            "variables": {
                "owner": owner,
                "repo": repo,
                "first": self.page_size,
                "after": after,
            },
        });

        let response = self
            .client
            .post(&self.graphql_url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();

        if status.as_u16() == 401 {
            return Err(GithubError::AuthenticationFailed.into());
        }

        if !status.is_success() {
            if rate_limit_exhausted(&headers) {
                return Err(GithubError::RateLimited {
                    reset_in_secs: reset_in_secs(&headers),
                }
                .into());
            }

            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let envelope: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| StarmailError::ParseError(format!("Invalid GraphQL response: {e}")))?;

        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            if errors.iter().any(is_rate_limit_error) {
                return Err(GithubError::RateLimited {
                    reset_in_secs: reset_in_secs(&headers),
                }
                .into());
            }
            return Err(GithubError::GraphQl(errors[0].message.clone()).into());
        }

        let repository = envelope
            .data
            .and_then(|d| d.repository)
            .ok_or_else(|| GithubError::RepositoryNotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
            })?;

        let connection = repository.stargazers;
        debug!(
            total = connection.total_count,
            nodes = connection.nodes.len(),
            has_next = connection.page_info.has_next_page,
            "Fetched stargazer page"
        );

        Ok(StargazerPage {
            total_count: connection.total_count,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
            nodes: connection.nodes,
        })
    }
}

impl PageSource for GithubClient {
    /// Fetch one page, retrying transient network faults with exponential
    /// backoff up to the configured ceiling.
    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        after: Option<&str>,
    ) -> Result<StargazerPage> {
        let mut last_error: Option<StarmailError> = None;

        for attempt in 0..self.max_retries {
            match self.execute(owner, repo, after).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() => {
                    if attempt + 1 < self.max_retries {
                        let backoff = Duration::from_secs(2u64.pow(attempt));
                        warn!(
                            attempt = attempt,
                            backoff_secs = backoff.as_secs(),
                            error = %e,
                            "Retrying after network error"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(GithubError::MaxRetriesExceeded {
            attempts: self.max_retries,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        }
        .into())
    }
}

fn is_rate_limit_error(error: &GraphQlErrorBody) -> bool {
    error.error_type.as_deref() == Some("RATE_LIMITED")
        || error.message.to_lowercase().contains("rate limit")
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    header_i64(headers, "x-ratelimit-remaining") == Some(0)
}

/// Seconds until the rate limit resets, from the reset-epoch header.
fn reset_in_secs(headers: &HeaderMap) -> i64 {
    header_i64(headers, "x-ratelimit-reset")
        .map(|reset| (reset - chrono::Utc::now().timestamp()).max(0))
        .unwrap_or(0)
}

fn header_i64(headers: &HeaderMap, key: &str) -> Option<i64> {
    headers.get(key)?.to_str().ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detected_by_type_or_message() {
        let by_type = GraphQlErrorBody {
            message: "something".to_string(),
            error_type: Some("RATE_LIMITED".to_string()),
        };
        assert!(is_rate_limit_error(&by_type));

        let by_message = GraphQlErrorBody {
            message: "API rate limit exceeded for user".to_string(),
            error_type: None,
        };
        assert!(is_rate_limit_error(&by_message));

        let other = GraphQlErrorBody {
            message: "Could not resolve to a Repository".to_string(),
            error_type: Some("NOT_FOUND".to_string()),
        };
        assert!(!is_rate_limit_error(&other));
    }

    #[test]
    fn reset_in_secs_clamps_past_resets_to_zero() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1000"));
        assert_eq!(reset_in_secs(&headers), 0);
    }

    #[test]
    fn envelope_parses_a_stargazer_page() {
        let body = r#"{
            "data": {
                "repository": {
                    "stargazers": {
                        "totalCount": 3,
                        "pageInfo": {"hasNextPage": true, "endCursor": "abc"},
                        "nodes": [
                            {"name": "Ada", "login": "ada", "email": "ada@example.com"},
                            {"name": null, "login": "ghost", "email": ""}
                        ]
                    }
                }
            }
        }"#;

        let envelope: GraphQlResponse = serde_json::from_str(body).unwrap();
        let connection = envelope.data.unwrap().repository.unwrap().stargazers;
        assert_eq!(connection.total_count, 3);
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("abc"));
        assert_eq!(connection.nodes.len(), 2);
        assert_eq!(connection.nodes[1].login, "ghost");
        assert_eq!(connection.nodes[1].email, "");
    }

    #[test]
    fn envelope_parses_an_errors_body() {
        let body = r#"{"data": null, "errors": [{"type": "RATE_LIMITED", "message": "rate limit"}]}"#;
        let envelope: GraphQlResponse = serde_json::from_str(body).unwrap();
        let errors = envelope.errors.unwrap();
        assert!(is_rate_limit_error(&errors[0]));
    }
}
