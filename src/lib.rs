//! Mediabatch - client-side batch media conversion
//!
//! This library accepts a batch of media files (images or videos),
//! drives each through a conversion backend under a shared
//! configuration, tracks fine-grained per-file progress, isolates
//! per-file failures, and exports the resulting artifacts.
//!
//! The central component is [`conversion::BatchConverter`], which owns
//! the [`batch::Batch`] state store and processes entries strictly
//! sequentially: the video backend is a single shared stateful
//! resource that cannot safely service two conversions at once.

pub mod batch;
pub mod conversion;
pub mod export;
pub mod validate;

// Re-exports
pub use batch::{Batch, BatchEntry, EntryStatus, MediaItem, OutputArtifact, PreviewHandle};
pub use conversion::{BatchConverter, RunReport};
pub use mediabatch_av::{FfmpegTranscoder, ImageConverter};
pub use mediabatch_common::{
    BatchError, ConversionConfig, ConversionError, ExportError, ImageBackend, ImageConfig,
    ImageFormat, MediaKind, ProgressFn, Resolution, SourceFile, TrimRange, ValidationError,
    VideoBackend, VideoConfig, VideoFormat,
};
