//! Artifact export.
//!
//! Turns a produced output buffer into a user-retrievable file named
//! `<original-stem>.<target-extension>`. Entries without an output are
//! skipped (or reported, for single export) rather than faulting.

use mediabatch_common::ExportError;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::batch::Batch;

/// Export the entry at `index` into `dir`.
///
/// # Errors
///
/// [`ExportError::NoOutput`] when the index is out of range or the
/// entry has no output yet; I/O errors from writing the file.
pub fn export_one(batch: &Batch, index: usize, dir: &Path) -> Result<PathBuf, ExportError> {
    let entry = batch.get(index).ok_or(ExportError::NoOutput { index })?;
    let artifact = entry.output().ok_or(ExportError::NoOutput { index })?;

    let file_name = format!("{}.{}", entry.item().stem(), artifact.extension);
    let path = dir.join(file_name);
    std::fs::write(&path, &artifact.data)?;

    info!(index, path = %path.display(), "exported artifact");
    Ok(path)
}

/// Export every entry that has an output, in index order.
///
/// Entries without outputs are skipped; each artifact is written as a
/// separate file (no archive packaging).
pub fn export_all(batch: &Batch, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut paths = Vec::new();
    for index in 0..batch.len() {
        let has_output = batch.get(index).map(|e| e.output().is_some()).unwrap_or(false);
        if has_output {
            paths.push(export_one(batch, index, dir)?);
        }
    }
    Ok(paths)
}
