//! GitHub GraphQL API client.

mod github;

pub use github::*;
