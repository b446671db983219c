//! The preview pipeline: probe → plan → extract → assemble → encode, with
//! every intermediate artifact tracked so the working directory ends up
//! holding only the source and, on success, the preview.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifacts::ArtifactGuard;
use crate::engine::PreviewEngine;
use crate::error::AppError;
use crate::ffmpeg::{ConcatStrategy, PreviewOptions, build_concat_manifest};
use crate::plan::{SamplePlan, sample_plan};

/// The input file plus the deterministic naming scheme for everything the
/// run creates next to it.
#[derive(Debug, Clone)]
pub struct SourceVideo {
    path: PathBuf,
    dir: PathBuf,
    stem: String,
}

impl SourceVideo {
    pub fn new(path: &Path) -> Result<Self, AppError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::from(format!("not a file path: {}", path.display())))?;
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Self {
            path: path.to_path_buf(),
            dir,
            stem,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clip_path(&self, index: usize, ext: &str) -> PathBuf {
        self.dir.join(format!("{}_clip_{}.{}", self.stem, index, ext))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(format!("{}_concat.txt", self.stem))
    }

    pub fn assembled_path(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}_assembled.{}", self.stem, ext))
    }

    pub fn preview_path(&self) -> PathBuf {
        self.dir.join(format!("{}_preview.webp", self.stem))
    }
}

/// Generate a looping preview for `input`, returning the preview path.
///
/// Stages run strictly in order and any failure aborts the run; the artifact
/// guard then removes whatever intermediates exist, including a partially
/// written preview. On success only the preview file survives.
pub fn generate_preview(
    engine: &dyn PreviewEngine,
    input: &Path,
    options: &PreviewOptions,
) -> Result<PathBuf, AppError> {
    let source = SourceVideo::new(input)?;

    let duration = engine.probe_duration(source.path())?;
    let plan = sample_plan(duration, options.effective_clip_secs())?;
    log::info!(
        target: "loopvid::pipeline",
        "{}: {:.1}s, sampling {} clips",
        source.path().display(),
        duration,
        plan.len()
    );

    let mut guard = ArtifactGuard::new();
    let strategy = options.effective_strategy();

    let clips = extract_clips(engine, &source, &plan, strategy, &mut guard)?;
    let assembled = assemble(engine, &source, &clips, strategy, &mut guard)?;

    let preview = source.preview_path();
    guard.track(preview.clone());
    engine.encode_preview(&assembled, &preview, options)?;
    guard.forget(&preview);
    guard.release_all();

    log::info!(
        target: "loopvid::pipeline",
        "preview written: {}",
        preview.display()
    );
    Ok(preview)
}

/// Cut one clip per plan entry, in offset order. For the transport strategy
/// each cut is immediately rewrapped as MPEG-TS and the pre-remux
/// intermediate is deleted before the next sample is touched.
fn extract_clips(
    engine: &dyn PreviewEngine,
    source: &SourceVideo,
    plan: &SamplePlan,
    strategy: ConcatStrategy,
    guard: &mut ArtifactGuard,
) -> Result<Vec<PathBuf>, AppError> {
    let mut clips = Vec::with_capacity(plan.len());
    for planned in &plan.clips {
        let cut = source.clip_path(planned.index, "mp4");
        guard.track(cut.clone());
        engine.cut_clip(source.path(), planned.offset_secs, planned.clip_secs, &cut)?;

        match strategy {
            ConcatStrategy::Transport => {
                let transport = source.clip_path(planned.index, "ts");
                guard.track(transport.clone());
                engine.remux_transport(&cut, &transport)?;
                guard.release(std::slice::from_ref(&cut));
                clips.push(transport);
            }
            ConcatStrategy::Demuxer => clips.push(cut),
        }
    }
    Ok(clips)
}

/// Join the clips, in extraction order, into a single stream. The clips (and
/// the manifest, if one was written) are retired before this returns.
fn assemble(
    engine: &dyn PreviewEngine,
    source: &SourceVideo,
    clips: &[PathBuf],
    strategy: ConcatStrategy,
    guard: &mut ArtifactGuard,
) -> Result<PathBuf, AppError> {
    let assembled = match strategy {
        ConcatStrategy::Transport => {
            let assembled = source.assembled_path("ts");
            guard.track(assembled.clone());
            engine.concatenate_transport(clips, &assembled)?;
            assembled
        }
        ConcatStrategy::Demuxer => {
            let manifest = source.manifest_path();
            guard.track(manifest.clone());
            fs::write(&manifest, build_concat_manifest(clips))?;

            let assembled = source.assembled_path("mp4");
            guard.track(assembled.clone());
            engine.concatenate_manifest(&manifest, &assembled)?;
            guard.release(std::slice::from_ref(&manifest));
            assembled
        }
    };
    guard.release(clips);
    Ok(assembled)
}
