//! Media kinds and source-file descriptors.
//!
//! A [`SourceFile`] is the raw admission input: a name, a declared MIME
//! type, and the file content. The content is held in [`Bytes`] so the
//! batch can hand it to backends without copying.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Kind of media a batch converts. Exactly one kind is active per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still images (JPEG, PNG, etc.).
    Image,
    /// Video files (MP4, MKV, etc.).
    Video,
}

impl MediaKind {
    /// The MIME type prefix files of this kind must declare.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Video => "video/",
        }
    }

    /// Whether a declared MIME type belongs to this kind.
    pub fn matches_mime(&self, mime: &str) -> bool {
        mime.starts_with(self.mime_prefix())
    }

    /// Maximum accepted file size in bytes for this kind.
    pub fn size_limit(&self) -> u64 {
        match self {
            Self::Image => 20 * 1024 * 1024,
            Self::Video => 200 * 1024 * 1024,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// A raw file submitted for admission: name, declared MIME type, and content.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name, including extension.
    pub name: String,
    /// Declared MIME type (e.g. `image/jpeg`).
    pub mime: String,
    /// File content. Never mutated after admission.
    pub data: Bytes,
}

impl SourceFile {
    /// Create a source file from in-memory content.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, inferring the MIME type from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime = mime_for_extension(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default()
                .as_str(),
        );
        let data = std::fs::read(path)?;
        Ok(Self::new(name, mime, data))
    }

    /// Content size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The file name up to the first dot, used to name exported artifacts.
    pub fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// The media kind this file declares, if recognized.
    pub fn kind(&self) -> Option<MediaKind> {
        if MediaKind::Image.matches_mime(&self.mime) {
            Some(MediaKind::Image)
        } else if MediaKind::Video.matches_mime(&self.mime) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Map a file extension to a declared MIME type.
fn mime_for_extension(ext: &str) -> String {
    let ext = ext.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "png" => "image/png".to_string(),
        "webp" => "image/webp".to_string(),
        "gif" => "image/gif".to_string(),
        "bmp" => "image/bmp".to_string(),
        "tif" | "tiff" => "image/tiff".to_string(),
        "mp4" => "video/mp4".to_string(),
        "avi" => "video/x-msvideo".to_string(),
        "mov" => "video/quicktime".to_string(),
        "wmv" => "video/x-ms-wmv".to_string(),
        "mkv" => "video/x-matroska".to_string(),
        "webm" => "video/webm".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}
