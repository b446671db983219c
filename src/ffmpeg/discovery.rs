use crate::error::AppError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

#[cfg(target_os = "windows")]
fn find_in_path() -> Option<PathBuf> {
    let output = Command::new("where").arg("ffmpeg").output().ok()?;
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout);
        let first = path.lines().next()?.trim();
        if !first.is_empty() {
            return Some(PathBuf::from(first));
        }
    }
    None
}

#[cfg(not(target_os = "windows"))]
fn find_in_path() -> Option<PathBuf> {
    let output = Command::new("which").arg("ffmpeg").output().ok()?;
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout);
        let first = path.lines().next()?.trim();
        if !first.is_empty() {
            return Some(PathBuf::from(first));
        }
    }
    None
}

fn common_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/opt/local/bin/ffmpeg"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
    {
        vec![]
    }
}

static FFMPEG_PATH_CACHE: OnceLock<PathBuf> = OnceLock::new();

fn resolve_ffmpeg_path() -> Result<PathBuf, AppError> {
    // Common paths first to avoid spawning which/where
    for path in common_paths() {
        if path.exists() {
            log::debug!(
                target: "loopvid::ffmpeg::discovery",
                "FFmpeg found in common path: {}",
                path.display()
            );
            return Ok(path);
        }
    }

    if let Some(p) = find_in_path() {
        if p.exists() {
            log::debug!(
                target: "loopvid::ffmpeg::discovery",
                "FFmpeg found in PATH: {}",
                p.display()
            );
            return Ok(p);
        }
    }

    log::error!(
        target: "loopvid::ffmpeg::discovery",
        "FFmpeg not found in PATH or common locations"
    );
    Err(AppError::FfmpegNotFound(
        "FFmpeg not found. Please install FFmpeg on your system:\n  - macOS: brew install ffmpeg\n  - Linux: sudo apt install ffmpeg\n  - Windows: Download from https://ffmpeg.org/download.html"
            .to_string(),
    ))
}

/// Get FFmpeg path. Cached for process lifetime.
/// Env override: FFMPEG_PATH takes precedence (for tests/CI or custom builds).
/// Falls back to common installation paths, then PATH.
pub fn get_ffmpeg_path() -> Result<&'static Path, AppError> {
    if let Some(path) = FFMPEG_PATH_CACHE.get() {
        return Ok(path.as_path());
    }
    let path = if let Ok(env_path) = std::env::var("FFMPEG_PATH") {
        let p = PathBuf::from(&env_path);
        if p.exists() {
            log::debug!(
                target: "loopvid::ffmpeg::discovery",
                "FFmpeg path from FFMPEG_PATH env: {}",
                p.display()
            );
            p
        } else {
            resolve_ffmpeg_path()?
        }
    } else {
        resolve_ffmpeg_path()?
    };
    let _ = FFMPEG_PATH_CACHE.set(path);
    Ok(FFMPEG_PATH_CACHE
        .get()
        .expect("cache initialized above")
        .as_path())
}

/// Paths to try for ffprobe given an ffmpeg binary path (suffixed first,
/// then plain). Split out so the derivation logic is unit-testable.
pub fn ffprobe_candidates(ffmpeg_path: &Path) -> Vec<PathBuf> {
    let parent = match ffmpeg_path.parent() {
        Some(p) => p,
        None => return vec![],
    };
    let mut candidates = Vec::with_capacity(2);
    let stem = ffmpeg_path.file_stem().and_then(|s| s.to_str());
    if let Some(stem) = stem {
        if let Some(suffix) = stem.strip_prefix("ffmpeg") {
            if !suffix.is_empty() {
                #[cfg(target_os = "windows")]
                candidates.push(parent.join(format!("ffprobe{suffix}.exe")));
                #[cfg(not(target_os = "windows"))]
                candidates.push(parent.join(format!("ffprobe{suffix}")));
            }
        }
    }
    #[cfg(target_os = "windows")]
    candidates.push(parent.join("ffprobe.exe"));
    #[cfg(not(target_os = "windows"))]
    candidates.push(parent.join("ffprobe"));
    candidates
}

/// Get ffprobe path. Same directory as ffmpeg (ffmpeg/ffprobe ship together).
/// If ffmpeg has a platform suffix (e.g. ffmpeg-x86_64-unknown-linux-gnu),
/// looks for ffprobe with the same suffix first.
pub fn get_ffprobe_path() -> Result<PathBuf, AppError> {
    let ffmpeg = get_ffmpeg_path()?;
    let parent = ffmpeg
        .parent()
        .ok_or_else(|| AppError::from("FFmpeg path has no parent directory".to_string()))?;
    for candidate in ffprobe_candidates(ffmpeg) {
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    #[cfg(target_os = "windows")]
    let ffprobe = parent.join("ffprobe.exe");
    #[cfg(not(target_os = "windows"))]
    let ffprobe = parent.join("ffprobe");
    Err(AppError::from(format!(
        "ffprobe not found at {} (FFmpeg dir: {})",
        ffprobe.display(),
        parent.display()
    )))
}
