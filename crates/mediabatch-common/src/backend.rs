//! Backend contracts the orchestrator drives.
//!
//! Backends are opaque async capabilities: buffer in, buffer out. The
//! image backend is pure from the caller's point of view; the video
//! backend reports fine-grained progress through a callback and owns a
//! lazily initialized shared resource, so it must never service two
//! conversions at once.

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{ImageConfig, VideoConfig};
use crate::error::ConversionError;

/// Ratio-of-completion callback. Receives integer progress in 0..=100
/// as reported by the backend.
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// Converts a single image buffer. No incremental progress; the caller
/// synthesizes coarse progress around the call.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn convert(&self, input: Bytes, config: &ImageConfig) -> Result<Bytes, ConversionError>;
}

/// Converts a single video buffer, reporting progress through
/// `on_progress`. Implementations initialize lazily on first use and
/// retry initialization on the next call if it failed.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn convert(
        &self,
        input: Bytes,
        config: &VideoConfig,
        on_progress: ProgressFn,
    ) -> Result<Bytes, ConversionError>;
}
