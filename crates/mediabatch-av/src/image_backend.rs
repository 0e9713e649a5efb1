//! Image conversion backend built on the `image` crate.
//!
//! Decode, optionally resize, then re-encode to the target format.
//! Everything happens in memory; the CPU-heavy work runs on the
//! blocking thread pool so the orchestrator loop stays responsive.

use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use image::DynamicImage;
use mediabatch_common::{ConversionError, ImageBackend, ImageConfig, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Pure-Rust image converter. Stateless; cheap to share across calls.
#[derive(Debug, Default, Clone)]
pub struct ImageConverter;

impl ImageConverter {
    /// Create a new image converter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageBackend for ImageConverter {
    async fn convert(&self, input: Bytes, config: &ImageConfig) -> Result<Bytes, ConversionError> {
        config.validate()?;
        let config = config.clone();
        tokio::task::spawn_blocking(move || convert_blocking(&input, &config))
            .await
            .map_err(|e| ConversionError::Encode(format!("conversion task panicked: {}", e)))?
    }
}

fn convert_blocking(input: &[u8], config: &ImageConfig) -> Result<Bytes, ConversionError> {
    let img = image::load_from_memory(input)
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    let img = resize_if_requested(img, config);

    debug!(
        format = %config.format,
        width = img.width(),
        height = img.height(),
        "encoding image"
    );

    let mut out = Cursor::new(Vec::new());
    match config.format {
        ImageFormat::Jpg | ImageFormat::Jpeg => {
            // JPEG has no alpha channel and is the only target where the
            // quality setting applies.
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, config.quality);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| ConversionError::Encode(e.to_string()))?;
        }
        other => {
            img.write_to(&mut out, target_format(other))
                .map_err(|e| ConversionError::Encode(e.to_string()))?;
        }
    }

    Ok(Bytes::from(out.into_inner()))
}

/// Resize to the requested dimensions; an absent axis keeps the
/// original dimension on that axis.
fn resize_if_requested(img: DynamicImage, config: &ImageConfig) -> DynamicImage {
    if config.width.is_none() && config.height.is_none() {
        return img;
    }
    let width = config.width.unwrap_or(img.width());
    let height = config.height.unwrap_or(img.height());
    if width == img.width() && height == img.height() {
        return img;
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}

fn target_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpg | ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Webp => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Tiff => image::ImageFormat::Tiff,
    }
}
