//! # mediabatch-common
//!
//! Shared types and contracts for mediabatch.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! - Media kinds and source-file descriptors ([`media`])
//! - Conversion configuration for both backends ([`config`])
//! - The backend traits the orchestrator drives ([`backend`])
//! - The error taxonomy ([`error`])

pub mod backend;
pub mod config;
pub mod error;
pub mod media;

// Re-exports
pub use backend::{ImageBackend, ProgressFn, VideoBackend};
pub use config::{
    ConversionConfig, ImageConfig, ImageFormat, Resolution, TrimRange, VideoConfig, VideoFormat,
};
pub use error::{BatchError, ConversionError, ExportError, ValidationError};
pub use media::{MediaKind, SourceFile};
