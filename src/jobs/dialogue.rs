//! Render a speaker-labelled dialogue with one voice per speaker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::read_text;
use crate::consts::DEFAULT_VOICE;
use crate::ssml::{DEFAULT_SPEAKER, dialogue, infer_level, rate_for_level};
use crate::tts::{AudioFormat, Synthesizer, save_audio};

/// Parse `Speaker=Voice` assignments. `*=Voice` sets the fallback voice.
/// Unassigned speakers fall back to the default narrator.
pub fn parse_voice_map(assignments: &[String]) -> Result<HashMap<String, String>> {
    let mut voices = HashMap::from([(DEFAULT_SPEAKER.to_string(), DEFAULT_VOICE.to_string())]);
    for assignment in assignments {
        let Some((speaker, voice)) = assignment.split_once('=') else {
            bail!("expected SPEAKER=VOICE, got {assignment:?}");
        };
        let (speaker, voice) = (speaker.trim(), voice.trim());
        if speaker.is_empty() || voice.is_empty() {
            bail!("expected SPEAKER=VOICE, got {assignment:?}");
        }
        let key = if speaker == "*" { DEFAULT_SPEAKER } else { speaker };
        voices.insert(key.to_string(), voice.to_string());
    }
    Ok(voices)
}

/// Where the generated SSML is kept next to the audio.
pub fn ssml_path(output: &Path) -> PathBuf {
    output.with_extension("ssml")
}

/// Synthesize the dialogue in `input` to `output`. The speaking rate comes
/// from the `Level<n>` directory in the input path. The SSML sent to the
/// endpoint is saved beside the output first.
pub async fn dialogue_file(
    tts: &dyn Synthesizer,
    input: &Path,
    output: &Path,
    voices: &HashMap<String, String>,
) -> Result<()> {
    let text = read_text(input).await?;
    let level = infer_level(input);
    let rate = rate_for_level(level);
    info!(
        level = %level.map_or_else(|| "unknown".to_string(), |l| l.to_string()),
        rate = ?rate,
        "inferred rate"
    );

    let ssml = dialogue(text.lines(), voices, &rate);
    if ssml.is_empty() {
        bail!("{} has no dialogue lines", input.display());
    }
    let ssml = ssml.render();

    let sidecar = ssml_path(output);
    if let Some(parent) = sidecar.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&sidecar, &ssml)
        .await
        .with_context(|| format!("failed to write {}", sidecar.display()))?;

    let audio = tts.synthesize(&ssml, AudioFormat::for_path(output)).await?;
    save_audio(&audio, output).await?;
    info!(path = %output.display(), "saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_map_has_default() {
        let voices = parse_voice_map(&[]).unwrap();
        assert_eq!(voices[DEFAULT_SPEAKER], DEFAULT_VOICE);
    }

    #[test]
    fn voice_map_assignments() {
        let voices = parse_voice_map(&[
            "Daniel=en-US-ChristopherNeural".to_string(),
            "*=en-US-AriaNeural".to_string(),
        ])
        .unwrap();
        assert_eq!(voices["Daniel"], "en-US-ChristopherNeural");
        assert_eq!(voices[DEFAULT_SPEAKER], "en-US-AriaNeural");
    }

    #[test]
    fn voice_map_rejects_bad_assignment() {
        assert!(parse_voice_map(&["Daniel".to_string()]).is_err());
        assert!(parse_voice_map(&["=voice".to_string()]).is_err());
    }

    #[test]
    fn sidecar_path() {
        assert_eq!(ssml_path(Path::new("out/talk.wav")), Path::new("out/talk.ssml"));
    }
}
