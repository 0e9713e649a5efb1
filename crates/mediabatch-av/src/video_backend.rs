//! Video transcoding backend driving the ffmpeg CLI.
//!
//! The transcoder is a shared stateful resource: tool discovery runs
//! lazily exactly once, concurrent callers await the same in-flight
//! initialization, and a failed initialization is retried on the next
//! call instead of poisoning the backend. Because ffmpeg runs against
//! scratch files on disk, callers must not overlap conversions; the
//! orchestrator processes entries strictly sequentially for this reason.

use async_trait::async_trait;
use bytes::Bytes;
use mediabatch_common::{ConversionError, ProgressFn, VideoBackend, VideoConfig};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::probe::probe_duration;
use crate::tools::require_tool;

/// Resolved tool paths, discovered once per session.
#[derive(Debug, Clone)]
struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

/// ffmpeg-based video transcoder.
pub struct FfmpegTranscoder {
    ffmpeg_name: String,
    ffprobe_name: String,
    tools: OnceCell<FfmpegTools>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTranscoder {
    /// Create a transcoder that discovers `ffmpeg`/`ffprobe` on PATH.
    pub fn new() -> Self {
        Self::with_tool_names("ffmpeg", "ffprobe")
    }

    /// Create a transcoder using custom tool names or paths.
    pub fn with_tool_names(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg_name: ffmpeg.into(),
            ffprobe_name: ffprobe.into(),
            tools: OnceCell::new(),
        }
    }

    /// Resolve tool paths, initializing at most once. A failed lookup
    /// leaves the cell unset so the next call retries.
    async fn ensure_tools(&self) -> Result<&FfmpegTools, ConversionError> {
        self.tools
            .get_or_try_init(|| async {
                let ffmpeg = require_tool(&self.ffmpeg_name)?;
                let ffprobe = require_tool(&self.ffprobe_name)?;
                debug!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "ffmpeg tools located");
                Ok::<_, ConversionError>(FfmpegTools { ffmpeg, ffprobe })
            })
            .await
            .map_err(|e| ConversionError::Init(e.to_string()))
    }
}

#[async_trait]
impl VideoBackend for FfmpegTranscoder {
    async fn convert(
        &self,
        input: Bytes,
        config: &VideoConfig,
        on_progress: ProgressFn,
    ) -> Result<Bytes, ConversionError> {
        config.validate()?;
        let tools = self.ensure_tools().await?.clone();

        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join("input");
        let output_path = scratch
            .path()
            .join(format!("output.{}", config.format.extension()));
        tokio::fs::write(&input_path, &input).await?;

        // Duration drives the progress mapping; without it the run
        // still works, it just reports no intermediate progress.
        let duration = match probe_duration(&tools.ffprobe, &input_path).await {
            Ok(d) => d.map(|d| d.as_secs_f64()),
            Err(e) => {
                warn!("duration probe failed, progress disabled: {}", e);
                None
            }
        };
        let expected_secs = expected_output_secs(duration, config);

        let args = build_args(&input_path, &output_path, config);
        debug!(?args, "running ffmpeg");

        let mut child = Command::new(&tools.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::tool_not_found(&self.ffmpeg_name)
                } else {
                    ConversionError::Io(e)
                }
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let progress_task = async {
            let Some(stdout) = stdout else { return };
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let (Some(us), Some(expected)) = (parse_out_time_us(&line), expected_secs) {
                    on_progress(progress_percent(us, expected));
                }
            }
        };

        let stderr_task = async {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        };

        let (_, stderr_text) = tokio::join!(progress_task, stderr_task);

        let status = child.wait().await?;
        if !status.success() {
            return Err(ConversionError::tool_failed(
                "ffmpeg",
                format!("{}: {}", status, stderr_text.trim()),
            ));
        }

        let data = tokio::fs::read(&output_path).await?;
        Ok(Bytes::from(data))
    }
}

/// Build the ffmpeg argument list for one conversion.
fn build_args(input: &Path, output: &Path, config: &VideoConfig) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ];

    if config.trim.has_start() {
        args.push("-ss".to_string());
        args.push(config.trim.start.to_string());
    }
    if let Some(end) = config.trim.effective_end() {
        args.push("-to".to_string());
        args.push(end.to_string());
    }
    if config.speed != 1.0 {
        args.push("-filter:v".to_string());
        args.push(format!("setpts={}*PTS", 1.0 / config.speed));
    }
    args.push("-b:v".to_string());
    args.push(format!("{}k", config.bitrate_kbps));
    if let Some(dim) = config.resolution.dimension_arg() {
        args.push("-s".to_string());
        args.push(dim);
    }

    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]);

    args
}

/// The duration the transcoded output should have, in seconds.
///
/// Accounts for the trim window and the playback-speed change. `None`
/// when it cannot be determined (unknown source duration and no end
/// bound), in which case progress reporting is skipped.
fn expected_output_secs(source_secs: Option<f64>, config: &VideoConfig) -> Option<f64> {
    let end = config.trim.effective_end().or(source_secs)?;
    let trimmed = end - config.trim.start;
    if trimmed <= 0.0 {
        return None;
    }
    Some(trimmed / config.speed)
}

/// Parse an `out_time_us=` / `out_time_ms=` line from ffmpeg's
/// `-progress` output. Both keys report microseconds.
fn parse_out_time_us(line: &str) -> Option<u64> {
    let (key, value) = line.trim().split_once('=')?;
    if key != "out_time_us" && key != "out_time_ms" {
        return None;
    }
    value.parse::<i64>().ok().filter(|v| *v >= 0).map(|v| v as u64)
}

/// Map elapsed output time to integer progress in 0..=100.
fn progress_percent(elapsed_us: u64, expected_secs: f64) -> u8 {
    let ratio = (elapsed_us as f64 / 1_000_000.0) / expected_secs;
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediabatch_common::{Resolution, TrimRange, VideoFormat};

    fn config() -> VideoConfig {
        VideoConfig::default()
    }

    #[test]
    fn test_build_args_defaults() {
        let args = build_args(Path::new("/tmp/input"), Path::new("/tmp/output.mp4"), &config());
        // No trim, speed 1, original resolution: only bitrate applies.
        assert!(!args.contains(&"-ss".to_string()));
        assert!(!args.contains(&"-to".to_string()));
        assert!(!args.contains(&"-filter:v".to_string()));
        assert!(!args.contains(&"-s".to_string()));
        let b = args.iter().position(|a| a == "-b:v").unwrap();
        assert_eq!(args[b + 1], "2000k");
        assert_eq!(args.last().unwrap(), "/tmp/output.mp4");
    }

    #[test]
    fn test_build_args_trim_end_zero_means_unbounded() {
        let mut c = config();
        c.format = VideoFormat::Webm;
        c.trim = TrimRange { start: 5.0, end: 0.0 };
        let args = build_args(Path::new("in"), Path::new("output.webm"), &c);
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "5");
        assert!(!args.contains(&"-to".to_string()));
    }

    #[test]
    fn test_build_args_trim_window() {
        let mut c = config();
        c.trim = TrimRange { start: 2.0, end: 8.0 };
        let args = build_args(Path::new("in"), Path::new("output.mp4"), &c);
        let to = args.iter().position(|a| a == "-to").unwrap();
        assert_eq!(args[to + 1], "8");
    }

    #[test]
    fn test_build_args_speed_filter() {
        let mut c = config();
        c.speed = 2.0;
        let args = build_args(Path::new("in"), Path::new("output.mp4"), &c);
        let f = args.iter().position(|a| a == "-filter:v").unwrap();
        assert_eq!(args[f + 1], "setpts=0.5*PTS");
    }

    #[test]
    fn test_build_args_resolution() {
        let mut c = config();
        c.resolution = Resolution::Custom {
            width: 1280,
            height: 720,
        };
        let args = build_args(Path::new("in"), Path::new("output.mp4"), &c);
        let s = args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(args[s + 1], "1280x720");
    }

    #[test]
    fn test_parse_out_time_us() {
        assert_eq!(parse_out_time_us("out_time_us=1500000"), Some(1_500_000));
        assert_eq!(parse_out_time_us("out_time_ms=1500000"), Some(1_500_000));
        assert_eq!(parse_out_time_us("out_time_us=-9223372036854775808"), None);
        assert_eq!(parse_out_time_us("frame=42"), None);
        assert_eq!(parse_out_time_us("progress=end"), None);
        assert_eq!(parse_out_time_us("garbage"), None);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 10.0), 0);
        assert_eq!(progress_percent(5_000_000, 10.0), 50);
        assert_eq!(progress_percent(10_000_000, 10.0), 100);
        // Overshoot clamps to 100.
        assert_eq!(progress_percent(15_000_000, 10.0), 100);
    }

    #[test]
    fn test_expected_output_secs() {
        // Unknown duration, no end bound: no progress possible.
        assert_eq!(expected_output_secs(None, &config()), None);

        // Source duration drives it when no end bound set.
        assert_eq!(expected_output_secs(Some(20.0), &config()), Some(20.0));

        // An end bound makes it computable even without duration.
        let mut c = config();
        c.trim = TrimRange { start: 2.0, end: 12.0 };
        assert_eq!(expected_output_secs(None, &c), Some(10.0));

        // Speed shortens the expected output.
        c.speed = 2.0;
        assert_eq!(expected_output_secs(None, &c), Some(5.0));

        // Start past the end of the stream: nothing to report.
        let mut c = config();
        c.trim = TrimRange { start: 30.0, end: 0.0 };
        assert_eq!(expected_output_secs(Some(20.0), &c), None);
    }

    #[tokio::test]
    async fn test_init_failure_is_retried_not_poisoned() {
        let backend = FfmpegTranscoder::with_tool_names("no_such_ffmpeg_xyz", "no_such_ffprobe_xyz");
        let input = Bytes::from_static(b"data");

        let err = backend
            .convert(input.clone(), &config(), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Init(_)));

        // A second attempt goes through initialization again rather
        // than observing a poisoned cell.
        let err = backend
            .convert(input, &config(), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Init(_)));
    }
}
