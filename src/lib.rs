//! starmail - GitHub stargazer contact export and NDJSON conversion.
//!
//! ## Task handlers
//!
//! - **fetch**: paginated GraphQL fetch of stargazer `{name, email}` records,
//!   appended to an NDJSON sink, with a file-based checkpoint for resume
//! - **csv**: NDJSON to a delimited flat file, with email normalization
//! - **xlsx**: NDJSON to a First Name / Last Name / Email spreadsheet
//!
//! ## Resume semantics
//!
//! The fetch loop appends a page to the sink and *then* persists the
//! checkpoint. A crash between those two writes re-appends the trailing page
//! on resume; the sink is append-only and never deduplicated.

pub mod checkpoint;
pub mod client;
pub mod convert;
pub mod fetch;
pub mod models;

// Re-exports for convenience
pub use checkpoint::{CheckpointStore, FetchCheckpoint};
pub use client::GithubClient;
pub use fetch::{FetchParams, PageSource, ProgressSink, StarFetcher};
pub use models::{Config, Result, StarRecord, StargazerPage, StarmailError};
