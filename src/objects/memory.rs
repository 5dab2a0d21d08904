use anyhow::Result;
use async_trait::async_trait;

use super::ObjectStore;

/// A fixed set of object keys, for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjects {
    keys: Vec<String>,
}

impl MemoryObjects {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_by_prefix() {
        let objects = MemoryObjects::new(["assets/audio/a.wav", "assets/scripts/a.txt"]);
        let keys = objects.list_keys("assets/audio/").await.unwrap();
        assert_eq!(keys, vec!["assets/audio/a.wav".to_string()]);
    }
}
