//! Checkpoint persistence for resumable fetch runs.

mod store;

pub use store::*;
