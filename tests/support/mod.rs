#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use loopvid::ffmpeg::discovery::get_ffmpeg_path;

/// Temp working directory plus a resolved ffmpeg for fixture generation.
pub struct IntegrationEnv {
    pub ffmpeg: PathBuf,
    dir: tempfile::TempDir,
}

impl IntegrationEnv {
    pub fn new() -> Self {
        let ffmpeg = get_ffmpeg_path().expect("FFmpeg not found").to_path_buf();
        let dir = tempfile::tempdir().expect("tempdir");
        Self { ffmpeg, dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Synthesize an H.264 test clip of the given length with lavfi testsrc.
    pub fn with_test_video(&self, name: &str, duration_secs: f32) -> PathBuf {
        let output_path = self.path(name);
        let status = Command::new(&self.ffmpeg)
            .args([
                "-loglevel",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                &format!("testsrc=duration={}:size=320x240:rate=30", duration_secs),
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                output_path.to_string_lossy().as_ref(),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .expect("failed to run ffmpeg for test video");
        assert!(status.success(), "ffmpeg failed to create test video");
        output_path
    }

    /// Names of everything currently in the working directory.
    pub fn listing(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("read_dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
