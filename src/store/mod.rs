pub mod firestore;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::consts::MAX_BATCH_WRITES;

/// Top-level collection holding the master copy of every material.
pub const MASTER_MATERIALS: &str = "materials";

/// `schools/<school>/materials`
pub fn school_materials(school: &str) -> String {
    format!("schools/{school}/materials")
}

/// `schools/<school>/classes`
pub fn school_classes(school: &str) -> String {
    format!("schools/{school}/classes")
}

/// `schools/<school>/classes/<class>/materials`
pub fn class_materials(school: &str, class: &str) -> String {
    format!("schools/{school}/classes/{class}/materials")
}

/// A document read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

/// One write in a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub collection: String,
    pub id: String,
    pub data: Map<String, Value>,
    /// Only touch the fields present in `data` instead of replacing the document.
    pub merge: bool,
    /// Fields set to the commit time by the store.
    pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
    /// Overwrite `collection/id` with `data`.
    pub fn set(collection: impl Into<String>, id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
            merge: false,
            server_timestamps: Vec::new(),
        }
    }

    pub fn merge(mut self) -> Self {
        self.merge = true;
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }
}

/// The document database. Could be Firestore, its emulator, or in-memory.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document directly under `collection`.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;
    /// Apply `writes` atomically.
    async fn commit(&self, writes: &[DocumentWrite]) -> Result<()>;
}

/// Commit `writes` in chunks the store accepts. Returns the number written.
pub async fn commit_batched(store: &dyn DocumentStore, writes: &[DocumentWrite]) -> Result<usize> {
    for chunk in writes.chunks(MAX_BATCH_WRITES) {
        store.commit(chunk).await?;
    }
    Ok(writes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(school_materials("Obu-high"), "schools/Obu-high/materials");
        assert_eq!(school_classes("Obu-high"), "schools/Obu-high/classes");
        assert_eq!(class_materials("Obu-high", "1A"), "schools/Obu-high/classes/1A/materials");
    }

    #[test]
    fn write_builder() {
        let write = DocumentWrite::set("c", "d", Map::new())
            .merge()
            .server_timestamp("copiedAt");
        assert!(write.merge);
        assert_eq!(write.server_timestamps, vec!["copiedAt".to_string()]);
    }
}
