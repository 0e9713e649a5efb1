//! The batch conversion orchestrator.
//!
//! [`BatchConverter`] owns the batch state store and drives every
//! entry through the matching backend, strictly sequentially in index
//! order. Failure of one entry never aborts the loop; each entry is
//! attempted exactly once per run. A running flag guards against
//! re-entrant runs and against structural batch edits while a run is
//! active, so index alignment cannot be corrupted mid-loop.

use bytes::Bytes;
use mediabatch_common::{
    BatchError, ConversionConfig, ConversionError, ImageBackend, MediaKind, ProgressFn,
    SourceFile, VideoBackend,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::batch::{Batch, MediaItem, OutputArtifact};
use crate::export;
use crate::validate::validate_submission;

/// Outcome of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Entries attempted (always the full batch).
    pub attempted: usize,
    /// Entries that produced a converted output.
    pub succeeded: usize,
    /// Entries that failed and received a placeholder output.
    pub failed: usize,
}

/// Resets the running flag when the run ends, on any exit path.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Accepts files into a batch and converts them under a shared config.
pub struct BatchConverter {
    batch: Arc<Mutex<Batch>>,
    running: Arc<AtomicBool>,
    image: Arc<dyn ImageBackend>,
    video: Arc<dyn VideoBackend>,
}

impl BatchConverter {
    /// Create a converter over the given backends.
    pub fn new(image: Arc<dyn ImageBackend>, video: Arc<dyn VideoBackend>) -> Self {
        Self {
            batch: Arc::new(Mutex::new(Batch::new())),
            running: Arc::new(AtomicBool::new(false)),
            image,
            video,
        }
    }

    /// Create a converter wired to the built-in backends: the `image`
    /// crate for images and the ffmpeg CLI for video.
    pub fn with_default_backends() -> Self {
        Self::new(
            Arc::new(mediabatch_av::ImageConverter::new()),
            Arc::new(mediabatch_av::FfmpegTranscoder::new()),
        )
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validate a submitted set and, if every file passes, replace the
    /// current batch with it. Rejecting a submission leaves the
    /// previously accepted batch untouched.
    ///
    /// # Errors
    ///
    /// - [`BatchError::RunInProgress`] while a run is active
    /// - [`BatchError::Validation`] when any file fails a rule
    /// - [`BatchError::Preview`] when a preview cannot be created
    pub fn admit(&self, kind: MediaKind, files: Vec<SourceFile>) -> Result<usize, BatchError> {
        if self.is_running() {
            return Err(BatchError::RunInProgress);
        }
        validate_submission(kind, &files)?;

        let mut items = Vec::with_capacity(files.len());
        for file in files {
            items.push(MediaItem::from_source(file, kind)?);
        }

        let count = items.len();
        self.batch.lock().replace_all(items);
        info!(count, %kind, "batch admitted");
        Ok(count)
    }

    /// Remove the entry at `index`. Out-of-range indices are a silent
    /// no-op; removal during a run is rejected.
    pub fn remove(&self, index: usize) -> Result<(), BatchError> {
        if self.is_running() {
            return Err(BatchError::RunInProgress);
        }
        self.batch.lock().remove_at(index);
        Ok(())
    }

    /// Clear the whole batch, releasing all previews.
    pub fn clear(&self) -> Result<(), BatchError> {
        if self.is_running() {
            return Err(BatchError::RunInProgress);
        }
        self.batch.lock().clear();
        Ok(())
    }

    /// Read from the batch under its lock.
    pub fn with_batch<R>(&self, f: impl FnOnce(&Batch) -> R) -> R {
        f(&self.batch.lock())
    }

    /// Per-entry progress values in index order.
    pub fn progress_snapshot(&self) -> Vec<u8> {
        self.batch
            .lock()
            .entries()
            .iter()
            .map(|e| e.progress())
            .collect()
    }

    /// Convert every entry in the batch under `config`.
    ///
    /// Entries are processed strictly sequentially in index order; the
    /// video backend is a single shared stateful resource that cannot
    /// safely service two conversions at once. On a per-entry failure
    /// the error is recorded, progress resets to 0, and the original
    /// source buffer is kept as a placeholder output so the batch
    /// stays complete for export.
    ///
    /// # Errors
    ///
    /// - [`BatchError::RunInProgress`] when a run is already active
    /// - [`BatchError::InvalidConfig`] when settings are out of range
    /// - [`BatchError::EmptyBatch`] when there is nothing to convert
    pub async fn run(&self, config: &ConversionConfig) -> Result<RunReport, BatchError> {
        config
            .validate()
            .map_err(|e| BatchError::InvalidConfig(e.to_string()))?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BatchError::RunInProgress);
        }
        let _guard = RunGuard(Arc::clone(&self.running));

        let total = {
            let mut batch = self.batch.lock();
            if batch.is_empty() {
                return Err(BatchError::EmptyBatch);
            }
            batch.reset_for_run();
            batch.len()
        };

        info!(total, kind = %config.kind(), "starting batch run");
        let mut report = RunReport {
            attempted: total,
            succeeded: 0,
            failed: 0,
        };

        for index in 0..total {
            let (name, kind, data) = {
                let batch = self.batch.lock();
                let entry = &batch.entries()[index];
                (
                    entry.item().name().to_string(),
                    entry.item().kind(),
                    entry.item().data().clone(),
                )
            };

            // Immediate "work started" floor: the image backend has no
            // incremental callback and the video backend may take a
            // moment before its first one fires.
            self.batch.lock().set_progress(index, 10);
            info!(index, %name, "converting");

            match self.convert_entry(index, kind, data.clone(), config).await {
                Ok(output) => {
                    let mut batch = self.batch.lock();
                    batch.set_output(
                        index,
                        OutputArtifact {
                            data: output,
                            mime: config.output_mime().to_string(),
                            extension: config.extension().to_string(),
                        },
                    );
                    batch.set_progress(index, 100);
                    batch.clear_error(index);
                    report.succeeded += 1;
                    info!(index, %name, "converted");
                }
                Err(e) => {
                    warn!(index, %name, "conversion failed: {}", e);
                    let mut batch = self.batch.lock();
                    batch.set_error(index, e);
                    batch.set_progress(index, 0);
                    // Keep the original buffer as a placeholder so the
                    // batch stays complete for export; the recorded
                    // error flags it as unconverted.
                    batch.set_output(
                        index,
                        OutputArtifact {
                            data,
                            mime: config.output_mime().to_string(),
                            extension: config.extension().to_string(),
                        },
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "batch run finished"
        );
        Ok(report)
    }

    async fn convert_entry(
        &self,
        index: usize,
        kind: MediaKind,
        data: Bytes,
        config: &ConversionConfig,
    ) -> Result<Bytes, ConversionError> {
        match (config, kind) {
            (ConversionConfig::Image(c), MediaKind::Image) => self.image.convert(data, c).await,
            (ConversionConfig::Video(c), MediaKind::Video) => {
                let batch = Arc::clone(&self.batch);
                let on_progress: ProgressFn = Box::new(move |pct| {
                    batch.lock().set_progress(index, pct);
                });
                self.video.convert(data, c, on_progress).await
            }
            (config, kind) => Err(ConversionError::Unsupported(format!(
                "{} config cannot convert a {} file",
                config.kind(),
                kind
            ))),
        }
    }

    /// Export the entry at `index` into `dir` as `<stem>.<extension>`.
    pub fn export_one(
        &self,
        index: usize,
        dir: &std::path::Path,
    ) -> Result<std::path::PathBuf, mediabatch_common::ExportError> {
        export::export_one(&self.batch.lock(), index, dir)
    }

    /// Export every entry that has an output, in index order.
    pub fn export_all(
        &self,
        dir: &std::path::Path,
    ) -> Result<Vec<std::path::PathBuf>, mediabatch_common::ExportError> {
        export::export_all(&self.batch.lock(), dir)
    }
}
