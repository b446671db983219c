//! Map FFmpeg exit codes to user-facing messages.
//!
//! Exit codes are from ffmpeg.c: 1 (general), 69 (rate exceeded),
//! 123 (hard exit), 255 (signal). -1 is used for spawn failure.
//! Stderr is kept as detail for debugging.

/// Short summary for the terminal plus the full stderr tail as detail.
#[derive(Debug, Clone)]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

/// Maps an FFmpeg exit code to a short user-facing summary. Stderr is passed
/// through as detail.
pub fn parse_ffmpeg_error(stderr: &str, exit_code: Option<i32>) -> FfmpegErrorPayload {
    let summary = match exit_code {
        Some(code) => {
            known_exit_code_summary(code).unwrap_or_else(|| format!("FFmpeg failed (exit code {}).", code))
        }
        None => first_line_truncated(stderr, 120),
    };
    FfmpegErrorPayload {
        summary,
        detail: stderr.trim().to_string(),
    }
}

/// Source-verified exit codes from ffmpeg.c.
fn known_exit_code_summary(code: i32) -> Option<String> {
    match code {
        -1 => Some("FFmpeg not found or failed to start.".into()),
        1 => Some("FFmpeg failed.".into()),
        69 => Some("Encoding rate limit exceeded.".into()),
        123 | 255 => Some("Encoding was stopped.".into()),
        _ => None,
    }
}

const ELLIPSIS: &str = "…";

/// First non-empty line of stderr, truncated to `max_len` bytes with an
/// ellipsis when cut.
fn first_line_truncated(stderr: &str, max_len: usize) -> String {
    let first = stderr
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim())
        .unwrap_or(stderr);
    if first.len() <= max_len {
        return first.to_string();
    }
    let mut cut = max_len.saturating_sub(ELLIPSIS.len());
    while cut > 0 && !first.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &first[..cut], ELLIPSIS)
}
