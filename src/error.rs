//! Crate error type. Every pipeline stage returns `Result<_, AppError>`;
//! only the binary entry point decides termination.

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    FfmpegNotFound(String),

    #[error("FFmpeg failed (code {code}): {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    #[error("ffprobe returned an unparseable duration: {0:?}")]
    BadProbeOutput(String),

    #[error("source too short for preview sampling ({0:.2}s)")]
    SourceTooShort(f64),

    #[error("FFmpeg timed out after {0}s")]
    TimedOut(u64),

    #[error("Aborted")]
    Aborted,
}

impl AppError {
    pub fn aborted() -> Self {
        Self::Aborted
    }

    pub fn ffmpeg_failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::FfmpegFailed {
            code,
            stderr: stderr.into(),
        }
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        if s == "Aborted" {
            AppError::Aborted
        } else {
            AppError::FfmpegFailed {
                code: -1,
                stderr: s,
            }
        }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}
