//! Seed a school's materials from the master collection.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::store::{
    DocumentStore, DocumentWrite, MASTER_MATERIALS, commit_batched, school_materials,
};

#[derive(Debug, Clone, Default)]
pub struct CopyMasterOptions {
    /// Only copy materials whose ID starts with this.
    pub prefix: Option<String>,
    /// List what would be copied without writing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyMasterReport {
    pub found: usize,
    /// IDs selected for copying (written unless it was a dry run).
    pub copied: Vec<String>,
}

/// Merge master materials into `schools/<school>/materials`, tagging each
/// copy with `masterMaterialId`, `enabled = true` and a server-set `copiedAt`.
pub async fn copy_master_materials(
    store: &dyn DocumentStore,
    school: &str,
    options: &CopyMasterOptions,
) -> Result<CopyMasterReport> {
    let target = school_materials(school);
    let masters = store
        .list(MASTER_MATERIALS)
        .await
        .context("failed to list master materials")?;

    let selected: Vec<_> = masters
        .iter()
        .filter(|doc| match &options.prefix {
            Some(prefix) => doc.id.starts_with(prefix.as_str()),
            None => true,
        })
        .collect();
    info!(
        src = MASTER_MATERIALS,
        dst = %target,
        found = masters.len(),
        to_copy = selected.len(),
        dry_run = options.dry_run,
        "copying master materials"
    );

    let writes: Vec<DocumentWrite> = selected
        .iter()
        .map(|doc| {
            let mut data = doc.data.clone();
            data.insert("masterMaterialId".to_string(), Value::from(doc.id.as_str()));
            data.insert("enabled".to_string(), Value::Bool(true));
            DocumentWrite::set(&target, &doc.id, data)
                .merge()
                .server_timestamp("copiedAt")
        })
        .collect();

    for write in &writes {
        info!(id = %write.id, "→");
    }
    if !options.dry_run {
        commit_batched(store, &writes)
            .await
            .context("failed to write school materials")?;
    }

    Ok(CopyMasterReport {
        found: masters.len(),
        copied: writes.into_iter().map(|w| w.id).collect(),
    })
}
