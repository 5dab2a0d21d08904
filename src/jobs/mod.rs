//! Batch jobs. Each takes its collaborators as arguments and runs to
//! completion or fails on the first error.

pub mod batch;
pub mod copy_materials;
pub mod copy_master;
pub mod dialogue;
pub mod dictation_clips;
pub mod evaluation;
pub mod speak;
pub mod sync_storage;

use std::path::Path;

use anyhow::{Context, Result};

/// Read a UTF-8 text input, naming the file on failure.
pub(crate) async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
