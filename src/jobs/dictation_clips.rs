//! Generate one audio clip per dictation question.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::read_text;
use crate::consts::CLIP_RATE;
use crate::dictation::{DictationFile, plan_clips};
use crate::ssml::{Rate, Voice, narration};
use crate::tts::{AudioFormat, Synthesizer, save_audio};

/// Synthesize every question of the dictation file at `input` into
/// `<out_dir>/<part>/<id>.wav`. Returns the written paths in order.
///
/// All question texts are resolved up front, so a malformed file writes
/// nothing. A failed synthesis aborts the run.
pub async fn generate_dictation_clips(
    tts: &dyn Synthesizer,
    input: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    info!(path = %input.display(), "loading dictation file");
    let json = read_text(input).await?;
    let file = DictationFile::from_json(&json)
        .with_context(|| format!("invalid dictation file {}", input.display()))?;
    let clips = plan_clips(&file, out_dir)?;

    let voice = Voice::default();
    let rate = Rate::Multiplier(CLIP_RATE);
    let mut written = Vec::with_capacity(clips.len());

    for clip in clips {
        info!(
            lesson = file.lesson_id(),
            part = %clip.part,
            question = %clip.question_id,
            text = %clip.text,
            "synthesizing"
        );
        let ssml = narration(&clip.text, &voice, &rate).render();
        let audio = tts
            .synthesize(&ssml, AudioFormat::Wav)
            .await
            .with_context(|| format!("question {}", clip.question_id))?;
        save_audio(&audio, &clip.out_path).await?;
        info!(path = %clip.out_path.display(), "saved");
        written.push(clip.out_path);
    }

    Ok(written)
}
