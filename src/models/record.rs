//! Record types flowing through the fetch loop.

use serde::{Deserialize, Serialize};

/// One raw stargazer node returned by the GitHub GraphQL API.
///
/// `name` is null for users who never set one; `email` is an empty string
/// for users whose email is hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StargazerNode {
    pub name: Option<String>,
    pub login: String,
    #[serde(default)]
    pub email: String,
}

/// One page of stargazers, produced per request.
#[derive(Debug, Clone)]
pub struct StargazerPage {
    /// Total stargazers reported by the source; live, may fluctuate
    pub total_count: u64,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
    pub nodes: Vec<StargazerNode>,
}

/// Output representation written to the sink, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub name: String,
    pub email: String,
}

impl StarRecord {
    /// Filter and transform a node into its output representation.
    ///
    /// Nodes with an empty email are excluded. The name falls back to the
    /// login when the profile name is null or empty.
    pub fn from_node(node: &StargazerNode) -> Option<Self> {
        if node.email.is_empty() {
            return None;
        }

        let name = match &node.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => node.login.clone(),
        };

        Some(Self {
            name,
            email: node.email.clone(),
        })
    }
}

/// Statistics for a completed fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Stargazers seen across all pages, including resumed progress
    pub records_seen: u64,
    /// Records appended to the sink by this run
    pub records_written: u64,
    /// Pages fetched by this run
    pub pages: u32,
    /// Last totalCount reported by the source
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: Option<&str>, login: &str, email: &str) -> StargazerNode {
        StargazerNode {
            name: name.map(str::to_string),
            login: login.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn empty_email_is_excluded() {
        assert!(StarRecord::from_node(&node(Some("Ada"), "ada", "")).is_none());
    }

    #[test]
    fn name_used_when_present() {
        let record = StarRecord::from_node(&node(Some("Ada Lovelace"), "ada", "ada@example.com"))
            .unwrap();
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.email, "ada@example.com");
    }

    #[test]
    fn login_fallback_for_null_or_empty_name() {
        let from_null = StarRecord::from_node(&node(None, "ada", "ada@example.com")).unwrap();
        assert_eq!(from_null.name, "ada");

        let from_empty = StarRecord::from_node(&node(Some(""), "ada", "ada@example.com")).unwrap();
        assert_eq!(from_empty.name, "ada");
    }
}
