//! # mediabatch-av
//!
//! Conversion backends for mediabatch.
//!
//! This crate provides the two engines the batch orchestrator drives:
//! - [`ImageConverter`] - pure-Rust image decode/resize/encode via the
//!   `image` crate
//! - [`FfmpegTranscoder`] - video transcoding through the ffmpeg CLI,
//!   with lazy one-time tool discovery and progress parsed from
//!   ffmpeg's `-progress` pipe
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use mediabatch_av::ImageConverter;
//! use mediabatch_common::{ImageBackend, ImageConfig};
//!
//! # async fn demo(data: Bytes) -> Result<(), mediabatch_common::ConversionError> {
//! let backend = ImageConverter::new();
//! let out = backend.convert(data, &ImageConfig::default()).await?;
//! println!("converted {} bytes", out.len());
//! # Ok(())
//! # }
//! ```

pub mod image_backend;
pub mod probe;
pub mod tools;
pub mod video_backend;

// Re-exports
pub use image_backend::ImageConverter;
pub use probe::probe_duration;
pub use tools::{check_tool, require_tool, ToolInfo};
pub use video_backend::FfmpegTranscoder;
