//! The batch state store.
//!
//! One [`BatchEntry`] per accepted file, held in a single ordered
//! collection. Progress, output, and error live on the entry itself,
//! so index alignment across the per-item views holds by construction
//! and cannot drift.

use bytes::Bytes;
use mediabatch_common::{ConversionError, MediaKind, SourceFile};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A transient on-disk preview of a source buffer.
///
/// Owned by its [`MediaItem`]; the underlying file is released exactly
/// once, when the entry is removed or the batch is replaced.
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    /// Write the source buffer to a temp file for on-screen display.
    pub fn create(data: &[u8]) -> std::io::Result<Self> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), data)?;
        Ok(Self { file })
    }

    /// Path to the preview file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// One accepted media file. The source buffer is never mutated or
/// discarded while the item exists in the batch.
#[derive(Debug)]
pub struct MediaItem {
    name: String,
    kind: MediaKind,
    size: u64,
    data: Bytes,
    preview: PreviewHandle,
}

impl MediaItem {
    /// Build an item from an admitted source file, creating its preview.
    /// `kind` is the batch's media kind, already checked by the gate.
    pub fn from_source(file: SourceFile, kind: MediaKind) -> std::io::Result<Self> {
        let preview = PreviewHandle::create(&file.data)?;
        Ok(Self {
            name: file.name,
            kind,
            size: file.data.len() as u64,
            data: file.data,
            preview,
        })
    }

    /// Original file name, including extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name up to the first dot, used to name exports.
    pub fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Media kind captured at admission.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Size in bytes captured at admission.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The original file content.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The on-screen preview handle.
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// A produced output buffer plus the metadata export needs.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    /// Converted content (or the original source buffer as a
    /// placeholder when conversion failed).
    pub data: Bytes,
    /// MIME type of the target format.
    pub mime: String,
    /// File extension used when exporting.
    pub extension: String,
}

/// Observable state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Admitted, not yet attempted in the current run.
    Pending,
    /// A conversion attempt is underway.
    InProgress,
    /// Converted successfully; output available.
    Succeeded,
    /// The last attempt failed; a placeholder output is in place.
    Failed,
}

/// One file's full conversion state within a batch.
#[derive(Debug)]
pub struct BatchEntry {
    item: MediaItem,
    progress: u8,
    output: Option<OutputArtifact>,
    error: Option<ConversionError>,
}

impl BatchEntry {
    fn new(item: MediaItem) -> Self {
        Self {
            item,
            progress: 0,
            output: None,
            error: None,
        }
    }

    /// The accepted media item.
    pub fn item(&self) -> &MediaItem {
        &self.item
    }

    /// Progress of the current attempt, 0..=100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// The produced output, if any.
    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    /// The error from the last attempt, if it failed.
    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    /// Derived lifecycle state.
    pub fn status(&self) -> EntryStatus {
        if self.error.is_some() {
            EntryStatus::Failed
        } else if self.progress == 100 && self.output.is_some() {
            EntryStatus::Succeeded
        } else if self.progress > 0 {
            EntryStatus::InProgress
        } else {
            EntryStatus::Pending
        }
    }
}

/// Ordered, index-addressed collection of batch entries.
///
/// Structural edits (`replace_all`, `remove_at`, `clear`) release the
/// preview handles of the entries they discard. The per-slot mutators
/// never resize or reorder the collection.
#[derive(Debug, Default)]
pub struct Batch {
    entries: Vec<BatchEntry>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&BatchEntry> {
        self.entries.get(index)
    }

    /// All entries in admission order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Discard all current entries (releasing their previews) and
    /// install a fresh set with progress 0, no outputs, no errors.
    pub fn replace_all(&mut self, items: Vec<MediaItem>) {
        self.entries = items.into_iter().map(BatchEntry::new).collect();
    }

    /// Remove all entries, releasing their previews.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove the entry at `index`, preserving the relative order of
    /// the rest. Out-of-range indices are a silent no-op.
    pub fn remove_at(&mut self, index: usize) {
        if index >= self.entries.len() {
            debug!(index, len = self.entries.len(), "remove_at out of range, ignoring");
            return;
        }
        self.entries.remove(index);
    }

    /// Reset every entry for a fresh run: progress 0, outputs and
    /// errors cleared. Re-running overwrites previous results.
    pub fn reset_for_run(&mut self) {
        for entry in &mut self.entries {
            entry.progress = 0;
            entry.output = None;
            entry.error = None;
        }
    }

    /// Set one entry's progress. Out-of-range indices are ignored.
    pub fn set_progress(&mut self, index: usize, value: u8) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.progress = value.min(100);
        }
    }

    /// Set one entry's output buffer. Out-of-range indices are ignored.
    pub fn set_output(&mut self, index: usize, output: OutputArtifact) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.output = Some(output);
        }
    }

    /// Record one entry's error. Out-of-range indices are ignored.
    pub fn set_error(&mut self, index: usize, error: ConversionError) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.error = Some(error);
        }
    }

    /// Clear one entry's error. Out-of-range indices are ignored.
    pub fn clear_error(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.error = None;
        }
    }
}
