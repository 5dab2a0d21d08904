//! Narrate a single text file.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use super::read_text;
use crate::ssml::{Rate, Voice, narration};
use crate::tts::{AudioFormat, Synthesizer, save_audio};

/// Read `input`, narrate it with `voice` at `rate`, and write `output`.
/// The audio format follows the output extension. Multipliers are sent as
/// signed percentages (`0.9` becomes `-10%`).
pub async fn speak_file(
    tts: &dyn Synthesizer,
    input: &Path,
    output: &Path,
    voice: &Voice,
    rate: &Rate,
) -> Result<()> {
    let text = read_text(input).await?;
    let text = text.trim();
    if text.is_empty() {
        bail!("{} is empty", input.display());
    }

    let rate = rate.as_percent();
    let format = AudioFormat::for_path(output);
    info!(
        input = %input.display(),
        voice = %voice.name,
        rate = ?rate,
        format = format.output_format(),
        "synthesizing"
    );
    let ssml = narration(text, voice, &rate).render();
    let audio = tts.synthesize(&ssml, format).await?;
    save_audio(&audio, output).await?;
    info!(path = %output.display(), bytes = audio.len(), "saved");
    Ok(())
}
