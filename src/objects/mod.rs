pub mod gcs;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// The object store holding lesson assets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Keys of every object whose name starts with `prefix`, in listing order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}
