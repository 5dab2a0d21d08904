//! Register every lesson audio file in the object store as a material.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::consts::AUDIO_PREFIX;
use crate::objects::ObjectStore;
use crate::store::{DocumentStore, DocumentWrite, commit_batched, school_materials};

/// Storage paths of every asset belonging to one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPaths {
    pub audio: String,
    pub script: String,
    pub subtitles: String,
    pub translation: String,
}

/// The material record derived from an audio key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: String,
    pub level: String,
    pub category: String,
    pub title: String,
    pub visible: bool,
    pub paths: MaterialPaths,
}

impl Material {
    pub fn to_document(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => bail!("material {} serialized to {other}", self.id),
        }
    }
}

/// Build the material for `assets/audio/<level>/<category>/<file>.wav`.
/// Keys of any other shape yield `None`.
pub fn material_from_key(key: &str) -> Option<Material> {
    let rest = key.strip_prefix(AUDIO_PREFIX)?;
    let stem = rest.strip_suffix(".wav")?;
    let mut parts = stem.split('/');
    let (level, category, file) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || [level, category, file].iter().any(|p| p.is_empty()) {
        return None;
    }

    Some(Material {
        id: format!("{level}_{category}_{file}"),
        level: level.to_string(),
        category: category.to_string(),
        title: file.replace('_', " "),
        visible: true,
        paths: MaterialPaths {
            audio: format!("assets/audio/{level}/{category}/{file}.wav"),
            script: format!("assets/scripts/{level}/{category}/{file}.txt"),
            subtitles: format!("assets/subtitles/{level}/{category}/{file}.json"),
            translation: format!("assets/translations/{level}/{category}/{file}_ja.json"),
        },
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub scanned: usize,
    pub synced: usize,
    pub skipped: usize,
}

/// Overwrite `schools/<school>/materials/<id>` for every audio key.
pub async fn sync_storage_to_firestore(
    objects: &dyn ObjectStore,
    store: &dyn DocumentStore,
    school: &str,
) -> Result<SyncReport> {
    let keys = objects
        .list_keys(AUDIO_PREFIX)
        .await
        .context("failed to list audio objects")?;
    let target = school_materials(school);

    let mut report = SyncReport {
        scanned: keys.len(),
        ..SyncReport::default()
    };
    let mut writes = Vec::new();
    for key in &keys {
        match material_from_key(key) {
            Some(material) => {
                info!(id = %material.id, "synced");
                writes.push(DocumentWrite::set(&target, &material.id, material.to_document()?));
            }
            None => {
                debug!(key = %key, "skipped");
                report.skipped += 1;
            }
        }
    }

    report.synced = commit_batched(store, &writes)
        .await
        .context("failed to write materials")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_material_from_key() {
        let material =
            material_from_key("assets/audio/Level2/Announcement/Platform_Change_Notice.wav").unwrap();
        assert_eq!(material.id, "Level2_Announcement_Platform_Change_Notice");
        assert_eq!(material.level, "Level2");
        assert_eq!(material.category, "Announcement");
        assert_eq!(material.title, "Platform Change Notice");
        assert!(material.visible);
        assert_eq!(
            material.paths.translation,
            "assets/translations/Level2/Announcement/Platform_Change_Notice_ja.json"
        );
        assert_eq!(
            material.paths.script,
            "assets/scripts/Level2/Announcement/Platform_Change_Notice.txt"
        );
    }

    #[test]
    fn skips_non_wav_and_wrong_depth() {
        assert!(material_from_key("assets/audio/Level2/Announcement/x.mp3").is_none());
        assert!(material_from_key("assets/audio/Level2/x.wav").is_none());
        assert!(material_from_key("assets/audio/Level2/A/B/x.wav").is_none());
        assert!(material_from_key("assets/audio/Level2//x.wav").is_none());
        assert!(material_from_key("assets/scripts/Level2/A/x.wav").is_none());
        assert!(material_from_key("assets/audio/").is_none());
    }

    #[test]
    fn document_shape() {
        let doc = material_from_key("assets/audio/L1/Talk/Hi.wav")
            .unwrap()
            .to_document()
            .unwrap();
        assert_eq!(doc["id"], "L1_Talk_Hi");
        assert_eq!(doc["visible"], true);
        assert_eq!(doc["paths"]["audio"], "assets/audio/L1/Talk/Hi.wav");
        assert_eq!(doc["paths"]["subtitles"], "assets/subtitles/L1/Talk/Hi.json");
    }
}
