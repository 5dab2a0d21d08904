//! Narrate every matching script under a directory tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::speak::speak_file;
use crate::ssml::{Rate, Voice};
use crate::tts::Synthesizer;

/// Script name picked up when none is given.
pub const DEFAULT_BASENAME: &str = "listening.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub found: usize,
    pub written: Vec<PathBuf>,
    /// Outputs that already existed.
    pub skipped: Vec<PathBuf>,
}

/// Every file under `root` named `basename`, sorted.
pub async fn find_scripts(root: &Path, basename: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.file_name().is_some_and(|name| name == basename) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// The `.mp3` written beside a script.
pub fn output_for(script: &Path) -> PathBuf {
    script.with_extension("mp3")
}

/// Narrate each `basename` script under `root` into a sibling `.mp3`,
/// leaving existing outputs alone so a rerun resumes where it stopped.
pub async fn batch_narrate(
    tts: &dyn Synthesizer,
    root: &Path,
    basename: &str,
    voice: &Voice,
    rate: &Rate,
) -> Result<BatchReport> {
    let scripts = find_scripts(root, basename).await?;
    info!(basename, found = scripts.len(), "scanned");

    let mut report = BatchReport {
        found: scripts.len(),
        ..BatchReport::default()
    };
    for script in scripts {
        let output = output_for(&script);
        if tokio::fs::try_exists(&output).await.unwrap_or(false) {
            info!(path = %output.display(), "skip");
            report.skipped.push(output);
            continue;
        }
        speak_file(tts, &script, &output, voice, rate).await?;
        report.written.push(output);
    }
    Ok(report)
}
