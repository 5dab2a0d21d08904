use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{AudioFormat, SynthesisError, Synthesizer};
use crate::config::SpeechConfig;

const SYNTHESIS_PATH: &str = "/cognitiveservices/v1";

/// Azure Cognitive Services text-to-speech over REST.
pub struct AzureSpeech {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    user_agent: String,
}

impl AzureSpeech {
    /// Client for the regional endpoint.
    pub fn new(config: &SpeechConfig, user_agent: impl Into<String>) -> Self {
        let base = format!("https://{}.tts.speech.microsoft.com", config.region);
        Self::with_base_url(&base, config, user_agent)
    }

    /// Client for an arbitrary base URL (a proxy or a test server).
    pub fn with_base_url(base: &str, config: &SpeechConfig, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", base.trim_end_matches('/'), SYNTHESIS_PATH),
            key: config.key.clone(),
            user_agent: user_agent.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Synthesizer for AzureSpeech {
    async fn synthesize(&self, ssml: &str, format: AudioFormat) -> Result<Vec<u8>> {
        debug!(endpoint = %self.endpoint, format = format.output_format(), "synthesizing");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", format.output_format())
            .header("User-Agent", &self.user_agent)
            .body(ssml.as_bytes().to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::failed(status, &text).into());
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
