//! Conversion configuration for the image and video backends.
//!
//! One config shape is active per batch; every entry shares it. All
//! enums serialize in lowercase to match the format names users pick.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;
use crate::media::MediaKind;

/// Target container format for image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// File extension for exported artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type of the produced output.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Whether this format applies lossy compression, making the
    /// quality setting meaningful.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg | Self::Webp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Target container format for video conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Avi,
    Mov,
    Wmv,
    Mkv,
    Webm,
}

impl VideoFormat {
    /// File extension for exported artifacts. Also selects the ffmpeg muxer.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mov => "mov",
            Self::Wmv => "wmv",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
        }
    }

    /// MIME type of the produced output.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Avi => "video/avi",
            Self::Mov => "video/mov",
            Self::Wmv => "video/wmv",
            Self::Mkv => "video/mkv",
            Self::Webm => "video/webm",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Output resolution: keep the original, or force a literal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    /// Keep the source resolution.
    Original,
    /// Scale to an exact width and height.
    Custom { width: u32, height: u32 },
}

impl Resolution {
    /// The `-s WxH` argument value, or `None` for the original size.
    pub fn dimension_arg(&self) -> Option<String> {
        match self {
            Self::Original => None,
            Self::Custom { width, height } => Some(format!("{}x{}", width, height)),
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Original
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Custom { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("original") {
            return Ok(Self::Original);
        }
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("invalid resolution: {}", s))?;
        let width: u32 = w.parse().map_err(|_| format!("invalid width: {}", w))?;
        let height: u32 = h.parse().map_err(|_| format!("invalid height: {}", h))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution dimensions must be positive: {}", s));
        }
        Ok(Self::Custom { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.to_string()
    }
}

/// A trim window in seconds.
///
/// `start = 0` means no start trim; `end = 0` or `end <= start` means
/// no end bound (trim runs to the end of the stream).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// The effective end bound, or `None` when the trim runs to the end.
    pub fn effective_end(&self) -> Option<f64> {
        if self.end > 0.0 && self.end > self.start {
            Some(self.end)
        } else {
            None
        }
    }

    /// Whether a start trim applies.
    pub fn has_start(&self) -> bool {
        self.start > 0.0
    }
}

/// Settings for the image backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Target image format.
    pub format: ImageFormat,
    /// Quality in 1..=100. Meaningful only for lossy formats; the
    /// backend may ignore it for lossless ones.
    pub quality: u8,
    /// Target width. `None` keeps the original width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the original height.
    pub height: Option<u32>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 80,
            width: None,
            height: None,
        }
    }
}

impl ImageConfig {
    /// Check that all settings are within their allowed ranges.
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.quality < 1 || self.quality > 100 {
            return Err(ConversionError::Unsupported(format!(
                "quality must be in 1..=100, got {}",
                self.quality
            )));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ConversionError::Unsupported(
                "target dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the video backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Target container format.
    pub format: VideoFormat,
    /// Playback-rate multiplier in 0.25..=4.0; 1.0 leaves speed unchanged.
    pub speed: f64,
    /// Target video bitrate in kbps, 500..=10000.
    pub bitrate_kbps: u32,
    /// Output resolution.
    pub resolution: Resolution,
    /// Trim window.
    pub trim: TrimRange,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            format: VideoFormat::Mp4,
            speed: 1.0,
            bitrate_kbps: 2000,
            resolution: Resolution::Original,
            trim: TrimRange::default(),
        }
    }
}

impl VideoConfig {
    /// Check that all settings are within their allowed ranges.
    pub fn validate(&self) -> Result<(), ConversionError> {
        if !(0.25..=4.0).contains(&self.speed) {
            return Err(ConversionError::Unsupported(format!(
                "speed must be in 0.25..=4.0, got {}",
                self.speed
            )));
        }
        if !(500..=10_000).contains(&self.bitrate_kbps) {
            return Err(ConversionError::Unsupported(format!(
                "bitrate must be in 500..=10000 kbps, got {}",
                self.bitrate_kbps
            )));
        }
        if self.trim.start < 0.0 || self.trim.end < 0.0 {
            return Err(ConversionError::Unsupported(
                "trim bounds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The single config shape active for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionConfig {
    Image(ImageConfig),
    Video(VideoConfig),
}

impl ConversionConfig {
    /// The media kind this config drives.
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image(_) => MediaKind::Image,
            Self::Video(_) => MediaKind::Video,
        }
    }

    /// Extension for exported artifacts produced under this config.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image(c) => c.format.extension(),
            Self::Video(c) => c.format.extension(),
        }
    }

    /// MIME type of outputs produced under this config.
    pub fn output_mime(&self) -> &'static str {
        match self {
            Self::Image(c) => c.format.mime(),
            Self::Video(c) => c.format.mime(),
        }
    }

    /// Check that all settings are within their allowed ranges.
    pub fn validate(&self) -> Result<(), ConversionError> {
        match self {
            Self::Image(c) => c.validate(),
            Self::Video(c) => c.validate(),
        }
    }
}
