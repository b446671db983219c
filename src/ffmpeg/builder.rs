//! Pure argv builders for every engine invocation the pipeline makes.
//! Kept free of process spawning so each command shape is unit-testable.

use std::path::Path;

use super::PreviewOptions;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Common prefix for every mutating ffmpeg invocation: never read stdin,
/// keep diagnostics to errors, overwrite outputs.
fn base_args() -> Vec<String> {
    ["-nostdin", "-hide_banner", "-loglevel", "error", "-y"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// ffprobe argv asking for the duration of the first video stream as a bare
/// decimal value (no wrapper, no key).
pub fn build_duration_probe_args(input: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        path_arg(input),
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "v:0".into(),
        "-show_entries".into(),
        "stream=duration".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
    ]
}

/// Stream-copy a clip of `clip_secs` starting at `offset_secs`, video
/// stream 0 only. The seek sits before `-i`; under `-c:v copy` the cut
/// starts at the preceding keyframe.
pub fn build_clip_copy_args(
    input: &Path,
    offset_secs: f64,
    clip_secs: f64,
    output: &Path,
) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-ss".into(),
        format!("{:.3}", offset_secs),
        "-i".into(),
        path_arg(input),
        "-t".into(),
        format!("{:.3}", clip_secs),
        "-map".into(),
        "0:v:0".into(),
        "-c:v".into(),
        "copy".into(),
        path_arg(output),
    ]);
    args
}

/// Rewrap an extracted clip as MPEG-TS so the `concat:` protocol can join it
/// byte-wise. The annexb bitstream filter converts H.264 from MP4 framing.
pub fn build_transport_remux_args(input: &Path, output: &Path) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-i".into(),
        path_arg(input),
        "-c".into(),
        "copy".into(),
        "-bsf:v".into(),
        "h264_mp4toannexb".into(),
        "-f".into(),
        "mpegts".into(),
        path_arg(output),
    ]);
    args
}

/// Join transport-stream clips with the `concat:` protocol into one copy-mux
/// output. Input order is the play order.
pub fn build_transport_concat_args(clips: &[std::path::PathBuf], output: &Path) -> Vec<String> {
    let joined = clips
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("|");
    let mut args = base_args();
    args.extend([
        "-i".into(),
        format!("concat:{}", joined),
        "-c".into(),
        "copy".into(),
        "-f".into(),
        "mpegts".into(),
        path_arg(output),
    ]);
    args
}

/// Contents of a concat-demuxer manifest: one `file '<path>'` line per clip,
/// in play order.
pub fn build_concat_manifest(clips: &[std::path::PathBuf]) -> String {
    let mut manifest = clips
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join("\n");
    if !manifest.is_empty() {
        manifest.push('\n');
    }
    manifest
}

/// Join clips listed in a manifest via the concat demuxer. `-safe 0` is
/// required because the manifest references paths outside ffmpeg's notion of
/// a sandboxed directory.
pub fn build_demuxer_concat_args(manifest: &Path, output: &Path) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        path_arg(manifest),
        "-c".into(),
        "copy".into(),
        path_arg(output),
    ]);
    args
}

/// Final encode: drop audio, loop forever, downsample frame rate and width
/// (lanczos, proportional height) into a libwebp animation.
pub fn build_preview_encode_args(
    input: &Path,
    output: &Path,
    options: &PreviewOptions,
) -> Vec<String> {
    let fps = options.fps.unwrap_or(6);
    let width = options.width.unwrap_or(480);
    let qscale = options.qscale.unwrap_or(40);
    let compression_level = options.compression_level.unwrap_or(6);

    let mut args = base_args();
    args.extend([
        "-progress".into(),
        "pipe:1".into(),
        "-i".into(),
        path_arg(input),
        "-an".into(),
        "-c:v".into(),
        "libwebp".into(),
        "-loop".into(),
        "0".into(),
        "-preset".into(),
        "picture".into(),
        "-vf".into(),
        format!("fps={},scale={}:-1:flags=lanczos", fps, width),
        "-qscale".into(),
        qscale.to_string(),
        "-compression_level".into(),
        compression_level.to_string(),
        path_arg(output),
    ]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args.iter().position(|a| a == flag).unwrap();
        &args[idx + 1]
    }

    #[test]
    fn duration_probe_requests_bare_value() {
        let args = build_duration_probe_args(Path::new("/in.mp4"));
        assert_eq!(value_after(&args, "-i"), "/in.mp4");
        assert_eq!(value_after(&args, "-select_streams"), "v:0");
        assert_eq!(value_after(&args, "-show_entries"), "stream=duration");
        assert_eq!(value_after(&args, "-of"), "default=noprint_wrappers=1:nokey=1");
    }

    #[test]
    fn clip_copy_seeks_before_input() {
        let args =
            build_clip_copy_args(Path::new("/in.mp4"), 20.0, 2.0, Path::new("/in_clip_0.mp4"));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < i, "-ss must precede -i for keyframe-snapped copy seek");
        assert_eq!(value_after(&args, "-ss"), "20.000");
        assert_eq!(value_after(&args, "-t"), "2.000");
        assert_eq!(value_after(&args, "-map"), "0:v:0");
        assert_eq!(value_after(&args, "-c:v"), "copy");
        assert!(args.contains(&"-y".to_string()));
        assert_eq!(args.last().unwrap(), "/in_clip_0.mp4");
    }

    #[test]
    fn transport_remux_uses_annexb_and_mpegts() {
        let args =
            build_transport_remux_args(Path::new("/clip.mp4"), Path::new("/clip.ts"));
        assert_eq!(value_after(&args, "-c"), "copy");
        assert_eq!(value_after(&args, "-bsf:v"), "h264_mp4toannexb");
        assert_eq!(value_after(&args, "-f"), "mpegts");
        assert_eq!(args.last().unwrap(), "/clip.ts");
    }

    #[test]
    fn transport_concat_joins_clips_in_order() {
        let clips = vec![
            PathBuf::from("/a_clip_0.ts"),
            PathBuf::from("/a_clip_1.ts"),
            PathBuf::from("/a_clip_2.ts"),
        ];
        let args = build_transport_concat_args(&clips, Path::new("/a_assembled.ts"));
        assert_eq!(
            value_after(&args, "-i"),
            "concat:/a_clip_0.ts|/a_clip_1.ts|/a_clip_2.ts"
        );
        assert_eq!(value_after(&args, "-c"), "copy");
        assert_eq!(args.last().unwrap(), "/a_assembled.ts");
    }

    #[test]
    fn manifest_lists_one_file_per_line_in_order() {
        let clips = vec![PathBuf::from("/a_clip_0.mp4"), PathBuf::from("/a_clip_1.mp4")];
        let manifest = build_concat_manifest(&clips);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines, vec!["file '/a_clip_0.mp4'", "file '/a_clip_1.mp4'"]);
        assert!(manifest.ends_with('\n'));
    }

    #[test]
    fn empty_manifest_is_empty() {
        assert!(build_concat_manifest(&[]).is_empty());
    }

    #[test]
    fn demuxer_concat_trusts_external_paths() {
        let args =
            build_demuxer_concat_args(Path::new("/a_concat.txt"), Path::new("/a_assembled.mp4"));
        assert_eq!(value_after(&args, "-f"), "concat");
        assert_eq!(value_after(&args, "-safe"), "0");
        assert_eq!(value_after(&args, "-i"), "/a_concat.txt");
        assert_eq!(value_after(&args, "-c"), "copy");
        assert_eq!(args.last().unwrap(), "/a_assembled.mp4");
    }

    #[test]
    fn encode_uses_default_tuning() {
        let args = build_preview_encode_args(
            Path::new("/a_assembled.ts"),
            Path::new("/a_preview.webp"),
            &PreviewOptions::default(),
        );
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(value_after(&args, "-c:v"), "libwebp");
        assert_eq!(value_after(&args, "-loop"), "0");
        assert_eq!(value_after(&args, "-preset"), "picture");
        assert_eq!(value_after(&args, "-vf"), "fps=6,scale=480:-1:flags=lanczos");
        assert_eq!(value_after(&args, "-qscale"), "40");
        assert_eq!(value_after(&args, "-compression_level"), "6");
        assert_eq!(value_after(&args, "-progress"), "pipe:1");
        assert_eq!(args.last().unwrap(), "/a_preview.webp");
    }

    #[test]
    fn encode_honors_overridden_tunables() {
        let options = PreviewOptions {
            fps: Some(12),
            width: Some(320),
            qscale: Some(60),
            compression_level: Some(4),
            ..PreviewOptions::default()
        };
        let args = build_preview_encode_args(
            Path::new("/in.ts"),
            Path::new("/out.webp"),
            &options,
        );
        assert_eq!(value_after(&args, "-vf"), "fps=12,scale=320:-1:flags=lanczos");
        assert_eq!(value_after(&args, "-qscale"), "60");
        assert_eq!(value_after(&args, "-compression_level"), "4");
    }

    #[test]
    fn mutating_commands_never_read_stdin() {
        let clip = build_clip_copy_args(Path::new("/i"), 1.0, 2.0, Path::new("/o"));
        let remux = build_transport_remux_args(Path::new("/i"), Path::new("/o"));
        let enc = build_preview_encode_args(
            Path::new("/i"),
            Path::new("/o"),
            &PreviewOptions::default(),
        );
        for args in [clip, remux, enc] {
            assert_eq!(args[0], "-nostdin");
            assert!(args.contains(&"-loglevel".to_string()));
        }
    }
}
