//! FFmpeg/ffprobe process execution.
//!
//! Spawns the engine as a child process, drains stdout/stderr on background
//! threads (progress lines become debug logs, stderr is kept as a capped
//! tail for error reporting), and waits with an optional deadline. The
//! active child is held in a process-wide slot so a Ctrl-C handler can
//! terminate it from another thread.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use parking_lot::Mutex;

use super::discovery::{get_ffmpeg_path, get_ffprobe_path};
use super::progress::ProgressTracker;
use crate::error::AppError;

/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;
/// Poll interval while waiting on the child.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Single active FFmpeg process. The pipeline is strictly sequential, so one
/// slot is enough; `terminate_active_ffmpeg` empties it to abort a run.
static ACTIVE_FFMPEG_PROCESS: Mutex<Option<Child>> = Mutex::new(None);

fn read_stream<R: std::io::Read + Send + 'static>(
    reader: R,
    collect: Option<Arc<Mutex<Vec<u8>>>>,
    duration_secs: Option<f64>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut tracker = ProgressTracker::new(duration_secs);
        let mut last_logged = 0.0_f64;
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            if let Some(ref buf) = collect {
                let mut guard = buf.lock();
                guard.extend_from_slice(line.as_bytes());
                guard.push(b'\n');
                if guard.len() > MAX_STDERR_BYTES {
                    let excess = guard.len() - MAX_STDERR_BYTES;
                    guard.drain(..excess);
                }
            }
            if let Some(progress) = tracker.observe(&line) {
                if progress - last_logged >= 0.1 || progress >= 1.0 {
                    last_logged = progress;
                    log::debug!(
                        target: "loopvid::ffmpeg::runner",
                        "FFmpeg progress: {:.0}%",
                        progress * 100.0
                    );
                }
            }
        }
    })
}

fn wait_with_deadline(timeout: Option<Duration>) -> Result<std::process::ExitStatus, AppError> {
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        let mut guard = ACTIVE_FFMPEG_PROCESS.lock();
        let Some(child) = guard.as_mut() else {
            // Emptied by terminate_active_ffmpeg.
            log::warn!(
                target: "loopvid::ffmpeg::runner",
                "FFmpeg process was terminated externally"
            );
            return Err(AppError::aborted());
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                guard.take();
                return Ok(status);
            }
            Ok(None) => {}
            Err(e) => {
                let mut child = guard.take().expect("child checked above");
                drop(guard);
                let _ = child.kill();
                let _ = child.wait();
                return Err(AppError::from(e.to_string()));
            }
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                let mut child = guard.take().expect("child checked above");
                drop(guard);
                let _ = child.kill();
                let _ = child.wait();
                let secs = timeout.map(|t| t.as_secs()).unwrap_or(0);
                log::error!(
                    target: "loopvid::ffmpeg::runner",
                    "FFmpeg exceeded the {}s deadline and was killed",
                    secs
                );
                return Err(AppError::TimedOut(secs));
            }
        }
        drop(guard);
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

/// Run FFmpeg and block until it exits, the deadline passes, or the run is
/// aborted. `duration_secs` seeds progress computation for the invocation's
/// expected output length.
pub fn run_ffmpeg_blocking(
    args: Vec<String>,
    duration_secs: Option<f64>,
    timeout: Option<Duration>,
) -> Result<(), AppError> {
    let ffmpeg_path = get_ffmpeg_path()?;

    let input_arg = args
        .iter()
        .position(|a| a == "-i")
        .and_then(|i| args.get(i + 1));
    let output_arg = args.last();
    log::debug!(
        target: "loopvid::ffmpeg::runner",
        "Spawning FFmpeg: input={:?}, output={:?}",
        input_arg,
        output_arg
    );

    let mut cmd = Command::new(ffmpeg_path);
    cmd.args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let mut child = cmd
        .spawn()
        .map_err(|e| AppError::from(format!("Failed to spawn FFmpeg: {}", e)))?;

    let stdout = match child.stdout.take() {
        Some(s) => s,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AppError::from("Failed to capture stdout"));
        }
    };
    let stderr = match child.stderr.take() {
        Some(s) => s,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AppError::from("Failed to capture stderr"));
        }
    };

    {
        let mut guard = ACTIVE_FFMPEG_PROCESS.lock();
        *guard = Some(child);
    }

    let stderr_buffer = Arc::new(Mutex::new(Vec::new()));
    let stdout_handle = read_stream(stdout, None, duration_secs);
    let stderr_handle = read_stream(stderr, Some(Arc::clone(&stderr_buffer)), duration_secs);

    let status = wait_with_deadline(timeout);

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let status = status?;
    let stderr_bytes = stderr_buffer.lock().clone();
    let stderr_str = String::from_utf8_lossy(&stderr_bytes).into_owned();

    if status.success() {
        log::debug!(
            target: "loopvid::ffmpeg::runner",
            "FFmpeg completed successfully"
        );
        Ok(())
    } else {
        let code = status.code().unwrap_or(-1);
        let err_preview = stderr_str
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .join("; ");
        log::error!(
            target: "loopvid::ffmpeg::runner",
            "FFmpeg failed (code={}): {}",
            code,
            err_preview
        );
        Err(AppError::FfmpegFailed {
            code,
            stderr: stderr_str,
        })
    }
}

/// Run ffprobe and return its stdout. Probe invocations are short and
/// non-interactive, so a plain captured wait is enough.
pub fn run_ffprobe_capture(args: Vec<String>) -> Result<String, AppError> {
    let ffprobe = get_ffprobe_path()?;
    let mut cmd = Command::new(&ffprobe);
    cmd.args(&args);
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let output = cmd
        .output()
        .map_err(|e| AppError::from(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::from(format!(
            "ffprobe failed: {}",
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| AppError::from("ffprobe output was not valid UTF-8"))
}

/// Kill the active FFmpeg child, if any. Safe to call from a signal handler
/// thread; the waiting runner observes the emptied slot and reports Aborted.
pub fn terminate_active_ffmpeg() {
    let mut guard = ACTIVE_FFMPEG_PROCESS.lock();
    if let Some(mut child) = guard.take() {
        log::info!(
            target: "loopvid::ffmpeg::runner",
            "Terminating FFmpeg process"
        );
        let _ = child.kill();
        let _ = child.wait();
    }
}
