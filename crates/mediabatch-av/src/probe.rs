//! Duration probing via ffprobe.
//!
//! The transcoder needs the source duration to map ffmpeg's elapsed
//! output time into a ratio of completion. A missing duration is not an
//! error; progress reporting is simply skipped for that file.

use mediabatch_common::ConversionError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file's duration using ffprobe.
///
/// Returns `Ok(None)` when the container does not report a duration.
pub async fn probe_duration(
    ffprobe: &Path,
    input: &Path,
) -> Result<Option<Duration>, ConversionError> {
    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(input)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConversionError::tool_not_found("ffprobe")
            } else {
                ConversionError::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConversionError::tool_failed("ffprobe", stderr.to_string()));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| ConversionError::Probe(format!("failed to parse ffprobe output: {}", e)))?;

    Ok(parsed
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .map(Duration::from_secs_f64))
}
