//! Fan a school's shared materials out to every class.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::store::{
    Document, DocumentStore, DocumentWrite, class_materials, commit_batched, school_classes,
    school_materials,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub classes: usize,
    pub materials: usize,
    pub copied: usize,
}

/// ID a material is stored under in each class: its `id` field when that is
/// a non-empty string, otherwise its document ID.
pub fn material_id(material: &Document) -> &str {
    material
        .data
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .unwrap_or(material.id.as_str())
}

/// Copy every document in `schools/<school>/materials` into
/// `schools/<school>/classes/<class>/materials` for every class.
pub async fn copy_materials_to_classes(store: &dyn DocumentStore, school: &str) -> Result<CopyReport> {
    let classes = store
        .list(&school_classes(school))
        .await
        .context("failed to list classes")?;
    let materials = store
        .list(&school_materials(school))
        .await
        .context("failed to list materials")?;
    info!(classes = classes.len(), materials = materials.len(), school, "loaded");

    let mut report = CopyReport {
        classes: classes.len(),
        materials: materials.len(),
        copied: 0,
    };

    for class in &classes {
        let target = class_materials(school, &class.id);
        let writes: Vec<DocumentWrite> = materials
            .iter()
            .map(|m| DocumentWrite::set(&target, material_id(m), m.data.clone()))
            .collect();
        let copied = commit_batched(store, &writes)
            .await
            .with_context(|| format!("failed to copy materials to class {}", class.id))?;
        info!(class = %class.id, copied, "copied materials");
        report.copied += copied;
    }

    Ok(report)
}
