//! Checkpoint state and persistence.
//!
//! The checkpoint is the minimal durable state of a fetch run: how many
//! records have been processed and the cursor to resume from. It is written
//! after every successfully appended page and deleted when the run completes
//! or when a fresh (non-resuming) run starts.

use crate::models::{Result, StarmailError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable progress of a fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCheckpoint {
    /// Records processed so far (seen, not necessarily written)
    pub count: u64,

    /// Cursor to resume from; absent on a fresh run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// Persists a [`FetchCheckpoint`] at a deterministic per-run path.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store for one owner/repo run, creating the directory if needed.
    pub fn for_run(dir: &Path, owner: &str, repo: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| StarmailError::io("creating checkpoint dir", e))?;

        Ok(Self {
            path: dir.join(format!("{owner}-{repo}-checkpoint.json")),
        })
    }

    /// Path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a checkpoint exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted checkpoint.
    ///
    /// A missing, unreadable, or unparseable file is treated as "no
    /// checkpoint": the run restarts from zero.
    pub fn load(&self) -> FetchCheckpoint {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return FetchCheckpoint::default(),
        };

        match serde_json::from_str(&content) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unparseable checkpoint");
                FetchCheckpoint::default()
            }
        }
    }

    /// Persist the checkpoint (temp file then rename).
    pub fn save(&self, checkpoint: &FetchCheckpoint) -> Result<()> {
        let temp_path = self.path.with_extension("tmp.json");
        let file = File::create(&temp_path)
            .map_err(|e| StarmailError::io("creating temp checkpoint", e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, checkpoint)
            .map_err(|e| StarmailError::Internal(format!("Serializing checkpoint: {e}")))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| StarmailError::io("renaming checkpoint", e))?;

        debug!(count = checkpoint.count, "Checkpoint saved");
        Ok(())
    }

    /// Delete the checkpoint file, tolerating absence.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StarmailError::io("removing checkpoint", e)),
        }
    }
}
