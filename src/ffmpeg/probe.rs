//! ffprobe-backed probing: the duration probe the pipeline plans from, and a
//! fuller JSON inspection used to verify encoded output.

use std::path::Path;

use serde::Deserialize;

use super::builder::build_duration_probe_args;
use super::runner::run_ffprobe_capture;
use crate::error::AppError;

/// Parse the bare-value duration probe output (a single newline-terminated
/// decimal number of seconds).
pub fn parse_duration_output(output: &str) -> Result<f64, AppError> {
    let trimmed = output.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| AppError::BadProbeOutput(trimmed.to_string()))
}

/// Duration of the primary video stream in seconds. Spawn failure, non-zero
/// exit, or unparseable output is a hard error; there is no fallback value.
pub fn probe_duration(path: &Path) -> Result<f64, AppError> {
    let output = run_ffprobe_capture(build_duration_probe_args(path))?;
    let duration = parse_duration_output(&output)?;
    log::debug!(
        target: "loopvid::ffmpeg::probe",
        "probed duration of {}: {:.3}s",
        path.display(),
        duration
    );
    Ok(duration)
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    #[serde(default)]
    format_name: Option<String>,
    #[serde(default)]
    nb_streams: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

/// Container/stream facts about a media file, as reported by ffprobe.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub duration: Option<f64>,
    pub format_name: Option<String>,
    pub stream_count: u32,
    pub video_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Parse full ffprobe JSON output into MediaInfo.
pub fn parse_media_info_json(json: &str) -> Result<MediaInfo, AppError> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| AppError::from(format!("Failed to parse ffprobe JSON: {}", e)))?;

    let format = output.format.as_ref();
    let duration = format
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok());
    let format_name = format.and_then(|f| f.format_name.clone());
    let stream_count = format.and_then(|f| f.nb_streams).unwrap_or(0);

    let video_stream = output
        .streams
        .as_ref()
        .and_then(|streams| streams.iter().find(|s| s.codec_type.as_deref() == Some("video")));

    Ok(MediaInfo {
        duration,
        format_name,
        stream_count,
        video_codec: video_stream.and_then(|s| s.codec_name.clone()),
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
    })
}

/// Full JSON inspection of a media file.
pub fn inspect(path: &Path) -> Result<MediaInfo, AppError> {
    let args = vec![
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        path.to_string_lossy().into_owned(),
    ];
    parse_media_info_json(&run_ffprobe_capture(args)?)
}
