use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use loopvid::ffmpeg::{parse_ffmpeg_error, terminate_active_ffmpeg};
use loopvid::{AppError, FfmpegEngine, PreviewOptions, generate_preview};

/// Generate a short looping WebP preview from a video file.
///
/// Samples four moments across the source, stream-copies a short clip at
/// each, stitches them in order and encodes the result next to the source
/// as `<name>_preview.webp`.
#[derive(Parser, Debug)]
#[command(name = "loopvid", version, about)]
struct Cli {
    /// Path to the source video file
    input: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = ctrlc::set_handler(|| {
        terminate_active_ffmpeg();
    }) {
        error!(target: "loopvid", "failed to install Ctrl-C handler: {}", e);
    }

    let options = PreviewOptions::default();
    let engine = FfmpegEngine::new(&options);

    match generate_preview(&engine, &cli.input, &options) {
        Ok(preview) => {
            info!(target: "loopvid", "done: {}", preview.display());
            ExitCode::SUCCESS
        }
        Err(AppError::FfmpegFailed { code, stderr }) => {
            let payload = parse_ffmpeg_error(&stderr, Some(code));
            error!(target: "loopvid", "{}", payload.summary);
            if !payload.detail.is_empty() {
                log::debug!(target: "loopvid", "{}", payload.detail);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(target: "loopvid", "{}", e);
            ExitCode::FAILURE
        }
    }
}
