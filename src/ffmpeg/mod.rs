mod builder;
pub mod discovery;
mod error;
pub mod probe;
mod progress;
mod runner;

pub use builder::{
    build_clip_copy_args, build_concat_manifest, build_demuxer_concat_args,
    build_duration_probe_args, build_preview_encode_args, build_transport_concat_args,
    build_transport_remux_args,
};
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use runner::{run_ffmpeg_blocking, run_ffprobe_capture, terminate_active_ffmpeg};

use serde::Deserialize;

/// How extracted clips are joined into a single stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatStrategy {
    /// Remux clips to MPEG-TS and join them with the `concat:` protocol.
    Transport,
    /// List clips in a manifest consumed by the concat demuxer (`-f concat`).
    Demuxer,
}

/// Tunables for one preview run: 2s clips, 6fps, 480px wide, qscale 40,
/// compression level 6 by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOptions {
    pub clip_secs: Option<f64>,
    pub fps: Option<u32>,
    pub width: Option<u32>,
    pub qscale: Option<u32>,
    pub compression_level: Option<u32>,
    pub strategy: Option<ConcatStrategy>,
    /// Per-invocation timeout. A hung engine process is killed and the run
    /// fails; None disables the deadline.
    pub timeout_secs: Option<u64>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            clip_secs: Some(2.0),
            fps: Some(6),
            width: Some(480),
            qscale: Some(40),
            compression_level: Some(6),
            strategy: Some(ConcatStrategy::Transport),
            timeout_secs: Some(600),
        }
    }
}

impl PreviewOptions {
    pub fn effective_clip_secs(&self) -> f64 {
        self.clip_secs.unwrap_or(2.0)
    }

    pub fn effective_strategy(&self) -> ConcatStrategy {
        self.strategy.unwrap_or(ConcatStrategy::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_preview_tuned() {
        let o = PreviewOptions::default();
        assert_eq!(o.effective_clip_secs(), 2.0);
        assert_eq!(o.fps, Some(6));
        assert_eq!(o.width, Some(480));
        assert_eq!(o.qscale, Some(40));
        assert_eq!(o.compression_level, Some(6));
        assert_eq!(o.effective_strategy(), ConcatStrategy::Transport);
    }

    #[test]
    fn strategy_deserializes_lowercase() {
        let o: PreviewOptions = serde_json::from_str(r#"{"strategy":"demuxer"}"#).unwrap();
        assert_eq!(o.strategy, Some(ConcatStrategy::Demuxer));
    }
}
