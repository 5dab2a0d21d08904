pub mod azure;
pub mod mock;

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

/// Longest slice of an error body kept in [`SynthesisError::Failed`].
pub const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech synthesis failed: HTTP {status} - {body}")]
    Failed { status: u16, body: String },
}

impl SynthesisError {
    /// Build a failure, keeping at most [`MAX_ERROR_BODY`] characters of the body.
    pub fn failed(status: u16, body: &str) -> Self {
        SynthesisError::Failed {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
    }
}

/// Audio container requested from the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// 16 kHz 16-bit mono PCM in a RIFF container.
    Wav,
    /// 16 kHz 128 kbit/s mono MP3.
    Mp3,
}

impl AudioFormat {
    /// Value of the `X-Microsoft-OutputFormat` header.
    pub fn output_format(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "riff-16khz-16bit-mono-pcm",
            AudioFormat::Mp3 => "audio-16khz-128kbitrate-mono-mp3",
        }
    }

    /// Pick the format from an output file's extension. Anything other than
    /// `.mp3` gets WAV.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp3") => AudioFormat::Mp3,
            _ => AudioFormat::Wav,
        }
    }
}

/// Something that turns an SSML document into audio bytes.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, ssml: &str, format: AudioFormat) -> Result<Vec<u8>>;
}

/// Write synthesized audio to `path`, creating parent directories.
pub async fn save_audio(audio: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, audio)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
