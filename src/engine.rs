//! The external engine as an explicit collaborator.
//!
//! Every unit of real media work the pipeline performs goes through this
//! trait, so tests can substitute a scripted engine and the pipeline logic
//! (ordering, artifact lifecycle, failure propagation) is exercised without
//! spawning processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::ffmpeg::{
    self, PreviewOptions, build_clip_copy_args, build_demuxer_concat_args,
    build_preview_encode_args, build_transport_concat_args, build_transport_remux_args,
    run_ffmpeg_blocking,
};

pub trait PreviewEngine {
    /// Duration of the primary video stream, in seconds.
    fn probe_duration(&self, source: &Path) -> Result<f64, AppError>;

    /// Stream-copy a clip of `clip_secs` starting at `offset_secs` into `dest`.
    fn cut_clip(
        &self,
        source: &Path,
        offset_secs: f64,
        clip_secs: f64,
        dest: &Path,
    ) -> Result<(), AppError>;

    /// Rewrap a clip as MPEG-TS for byte-level concatenation.
    fn remux_transport(&self, clip: &Path, dest: &Path) -> Result<(), AppError>;

    /// Join transport-stream clips, in the given order, into `dest`.
    fn concatenate_transport(&self, clips: &[PathBuf], dest: &Path) -> Result<(), AppError>;

    /// Join the clips listed in `manifest` into `dest` via the concat demuxer.
    fn concatenate_manifest(&self, manifest: &Path, dest: &Path) -> Result<(), AppError>;

    /// Encode the assembled stream into the looping preview image.
    fn encode_preview(
        &self,
        assembled: &Path,
        dest: &Path,
        options: &PreviewOptions,
    ) -> Result<(), AppError>;
}

/// Production engine: builds argv via the ffmpeg module and runs the real
/// binaries, applying the configured per-invocation deadline.
#[derive(Debug, Default)]
pub struct FfmpegEngine {
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    pub fn new(options: &PreviewOptions) -> Self {
        Self {
            timeout: options.timeout_secs.map(Duration::from_secs),
        }
    }
}

impl PreviewEngine for FfmpegEngine {
    fn probe_duration(&self, source: &Path) -> Result<f64, AppError> {
        ffmpeg::probe::probe_duration(source)
    }

    fn cut_clip(
        &self,
        source: &Path,
        offset_secs: f64,
        clip_secs: f64,
        dest: &Path,
    ) -> Result<(), AppError> {
        let args = build_clip_copy_args(source, offset_secs, clip_secs, dest);
        run_ffmpeg_blocking(args, Some(clip_secs), self.timeout)
    }

    fn remux_transport(&self, clip: &Path, dest: &Path) -> Result<(), AppError> {
        let args = build_transport_remux_args(clip, dest);
        run_ffmpeg_blocking(args, None, self.timeout)
    }

    fn concatenate_transport(&self, clips: &[PathBuf], dest: &Path) -> Result<(), AppError> {
        let args = build_transport_concat_args(clips, dest);
        run_ffmpeg_blocking(args, None, self.timeout)
    }

    fn concatenate_manifest(&self, manifest: &Path, dest: &Path) -> Result<(), AppError> {
        let args = build_demuxer_concat_args(manifest, dest);
        run_ffmpeg_blocking(args, None, self.timeout)
    }

    fn encode_preview(
        &self,
        assembled: &Path,
        dest: &Path,
        options: &PreviewOptions,
    ) -> Result<(), AppError> {
        let args = build_preview_encode_args(assembled, dest, options);
        run_ffmpeg_blocking(args, None, self.timeout)
    }
}
