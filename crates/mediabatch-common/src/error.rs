//! Error types used throughout mediabatch.
//!
//! Each failure domain gets its own enum: admission ([`ValidationError`]),
//! per-entry conversion ([`ConversionError`]), batch lifecycle
//! ([`BatchError`]), and artifact export ([`ExportError`]).

/// Errors raised by the validation gate at admission time.
///
/// Admission is all-or-nothing: a single offending file rejects the
/// whole submission, and the previously accepted batch is left intact.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The submission contained no files.
    #[error("no files were submitted")]
    Empty,

    /// A file's MIME type does not match the expected media kind.
    #[error("{name} is not a valid {expected} file (got {mime})")]
    WrongKind {
        name: String,
        mime: String,
        expected: crate::media::MediaKind,
    },

    /// A file exceeds the size limit for its media kind.
    #[error("{name} exceeds the {} MiB size limit ({size} bytes)", .limit / (1024 * 1024))]
    TooLarge { name: String, size: u64, limit: u64 },
}

/// Errors that can occur while converting a single entry.
///
/// These are caught at the entry boundary inside the orchestrator loop
/// and recorded on the entry; they never abort the batch.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The backend failed to initialize. Initialization is retried on
    /// the next use rather than cached as permanently broken.
    #[error("backend initialization failed: {0}")]
    Init(String),

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Failed to probe media metadata.
    #[error("failed to probe media: {0}")]
    Probe(String),

    /// Failed to decode the input buffer.
    #[error("failed to decode input: {0}")]
    Decode(String),

    /// Failed to encode the output buffer.
    #[error("failed to encode output: {0}")]
    Encode(String),

    /// Unsupported operation or format.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the batch lifecycle itself, as opposed to a single
/// entry's conversion.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A run is already in progress. Starting a second run or editing
    /// the batch structure must wait for the active run to finish.
    #[error("a conversion run is already in progress")]
    RunInProgress,

    /// The batch has no entries to convert.
    #[error("the batch is empty")]
    EmptyBatch,

    /// The shared configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The submitted set failed admission.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A preview handle could not be created for an accepted file.
    #[error("failed to create preview: {0}")]
    Preview(#[from] std::io::Error),
}

/// Errors raised when exporting a converted artifact.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The entry at this index has no output to export yet.
    #[error("entry {index} has no converted output")]
    NoOutput { index: usize },

    /// An I/O error occurred while writing the artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::WrongKind {
            name: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
            expected: MediaKind::Image,
        };
        assert_eq!(
            err.to_string(),
            "notes.txt is not a valid image file (got text/plain)"
        );

        let err = ValidationError::TooLarge {
            name: "movie.mkv".to_string(),
            size: 250 * 1024 * 1024,
            limit: 200 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "movie.mkv exceeds the 200 MiB size limit (262144000 bytes)"
        );
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::tool_not_found("ffmpeg");
        assert_eq!(err.to_string(), "tool not found: ffmpeg");

        let err = ConversionError::tool_failed("ffmpeg", "exit status 1");
        assert_eq!(err.to_string(), "tool execution failed: ffmpeg: exit status 1");

        let err = ConversionError::Init("ffmpeg missing".to_string());
        assert_eq!(err.to_string(), "backend initialization failed: ffmpeg missing");
    }

    #[test]
    fn test_conversion_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConversionError::from(io_err);
        assert!(matches!(err, ConversionError::Io(_)));
    }

    #[test]
    fn test_export_error_display() {
        let err = ExportError::NoOutput { index: 2 };
        assert_eq!(err.to_string(), "entry 2 has no converted output");
    }
}
