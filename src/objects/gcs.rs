use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::ObjectStore;

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// A Cloud Storage bucket read through the JSON API.
pub struct Gcs {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

impl Gcs {
    pub fn new(bucket: impl Into<String>, access_token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, bucket, access_token)
    }

    pub fn with_base_url(base: &str, bucket: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_token,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for Gcs {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let url = format!("{}/storage/v1/b/{}/o", self.base_url, self.bucket);
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("prefix", prefix.to_string()), ("fields", "items(name),nextPageToken".to_string())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let page_url = reqwest::Url::parse_with_params(&url, &params)
                .with_context(|| format!("invalid bucket URL: {url}"))?;

            let mut req = self.client.get(page_url);
            if let Some(token) = &self.access_token {
                req = req.bearer_auth(token);
            }
            let resp = req.send().await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                bail!("listing gs://{}/{prefix} failed ({status}): {text}", self.bucket);
            }

            let page: ListResponse = resp.json().await?;
            debug!(bucket = %self.bucket, count = page.items.len(), "listed page");
            keys.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<Item>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Item {
    name: String,
}
