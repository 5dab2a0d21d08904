use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Document, DocumentStore, DocumentWrite};

type Collections = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// In-process document store for tests and dry runs.
///
/// Server timestamps are stored as milliseconds since the epoch.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a document in place without counting a commit.
    pub fn insert(&self, collection: &str, id: &str, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    /// Number of `commit` calls so far.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, writes: &[DocumentWrite]) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let mut collections = self.collections.lock().unwrap();
        for write in writes {
            let docs = collections.entry(write.collection.clone()).or_default();
            let doc = docs.entry(write.id.clone()).or_default();
            if !write.merge {
                doc.clear();
            }
            for (key, value) in &write.data {
                doc.insert(key.clone(), value.clone());
            }
            for field in &write.server_timestamps {
                doc.insert(field.clone(), Value::from(now));
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn list_missing_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.list("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        store.insert("c", "d", json!({"a": 1, "b": 2}));
        store
            .commit(&[DocumentWrite::set("c", "d", object(json!({"a": 3})))])
            .await
            .unwrap();
        assert_eq!(store.get("c", "d").unwrap(), object(json!({"a": 3})));
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn merge_keeps_other_fields() {
        let store = MemoryStore::new();
        store.insert("c", "d", json!({"a": 1, "b": 2}));
        store
            .commit(&[DocumentWrite::set("c", "d", object(json!({"a": 3}))).merge()])
            .await
            .unwrap();
        assert_eq!(store.get("c", "d").unwrap(), object(json!({"a": 3, "b": 2})));
    }

    #[tokio::test]
    async fn server_timestamp_is_filled() {
        let store = MemoryStore::new();
        store
            .commit(&[DocumentWrite::set("c", "d", Map::new()).server_timestamp("at")])
            .await
            .unwrap();
        assert!(store.get("c", "d").unwrap()["at"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn list_is_sorted_by_id() {
        let store = MemoryStore::new();
        store.insert("c", "b", json!({}));
        store.insert("c", "a", json!({}));
        let ids: Vec<String> = store.list("c").await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.count("c"), 2);
    }
}
