//! Generate listening-test audio from evaluation scripts.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::read_text;
use crate::ssml::{LABEL_PAUSE, Rate, Voice, labelled_narration};
use crate::tts::{AudioFormat, Synthesizer, save_audio};

/// A script file and the audio file generated from it, both relative to
/// the evaluation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPair {
    pub script: String,
    pub audio: String,
}

impl FromStr for ScriptPair {
    type Err = anyhow::Error;

    /// Parse `script.txt:audio.wav`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((script, audio)) if !script.is_empty() && !audio.is_empty() => Ok(Self {
                script: script.to_string(),
                audio: audio.to_string(),
            }),
            _ => bail!("expected SCRIPT:AUDIO, got {s:?}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Synthesize each script in `dir`. The first line of a script is read as
/// its label, followed by a pause. Missing scripts are skipped with a warning.
pub async fn generate_evaluation_audio(
    tts: &dyn Synthesizer,
    dir: &Path,
    pairs: &[ScriptPair],
    rate: &Rate,
) -> Result<EvaluationReport> {
    let voice = Voice::default();
    let mut report = EvaluationReport::default();

    for pair in pairs {
        let script_path = dir.join(&pair.script);
        let out_path = dir.join(&pair.audio);

        if !tokio::fs::try_exists(&script_path).await.unwrap_or(false) {
            warn!(path = %script_path.display(), "script not found, skipping");
            report.skipped.push(script_path);
            continue;
        }

        let text = read_text(&script_path).await?;
        let text = text.trim();
        info!(script = %pair.script, preview = %preview(text), "synthesizing");

        let ssml = labelled_narration(text, &voice, rate, LABEL_PAUSE).render();
        let audio = tts.synthesize(&ssml, AudioFormat::for_path(&out_path)).await?;
        save_audio(&audio, &out_path).await?;
        info!(path = %out_path.display(), "saved");
        report.written.push(out_path);
    }

    Ok(report)
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(40).collect();
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head
    }
}
