//! Resumable stargazer fetch loop.
//!
//! The loop walks `INIT → FETCHING → (APPENDING → CHECKPOINTING →
//! FETCHING)* → DONE`, threading an explicit [`FetchCheckpoint`] value
//! through each step. Pagination is strictly serial: each page's cursor
//! comes from the previous response.

mod progress;
mod runner;

pub use progress::*;
pub use runner::*;
