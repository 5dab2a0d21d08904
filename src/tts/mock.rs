use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{AudioFormat, SynthesisError, Synthesizer};

/// A scripted synthesizer for tests. Records every request and answers
/// with fixed audio, or fails from the given call onwards.
pub struct MockSynthesizer {
    audio: Vec<u8>,
    fail_from: Option<usize>,
    requests: Mutex<Vec<(String, AudioFormat)>>,
}

impl MockSynthesizer {
    pub fn new(audio: impl Into<Vec<u8>>) -> Self {
        Self {
            audio: audio.into(),
            fail_from: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call starting with the zero-based call `index`.
    pub fn failing_from(mut self, index: usize) -> Self {
        self.fail_from = Some(index);
        self
    }

    /// Every SSML document received so far, in order.
    pub fn requests(&self) -> Vec<(String, AudioFormat)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, ssml: &str, format: AudioFormat) -> Result<Vec<u8>> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push((ssml.to_string(), format));
        if self.fail_from.is_some_and(|from| index >= from) {
            return Err(SynthesisError::failed(500, "MockSynthesizer: scripted failure").into());
        }
        Ok(self.audio.clone())
    }
}
