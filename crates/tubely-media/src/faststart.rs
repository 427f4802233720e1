//! Fast-start rewriting.
//!
//! Moves the MP4 index (`moov` atom) in front of the media payload so that
//! playback can begin before the whole file is downloaded. Streams are copied,
//! never re-encoded.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the input path to form the output path.
pub const FASTSTART_SUFFIX: &str = ".processing";

/// Output path for a given input.
pub fn fast_start_output_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(FASTSTART_SUFFIX);
    PathBuf::from(path)
}

/// Build the stream-copy fast-start command.
pub fn fast_start_command(input: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .stream_copy()
        .movflags("faststart")
        .format("mp4")
}

/// Rewrite `input` for fast-start playback, returning the new file's path.
///
/// The input is left untouched. On failure any partial output is removed.
pub async fn rewrite_for_fast_start(input: &Path, runner: &FfmpegRunner) -> MediaResult<PathBuf> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let output = fast_start_output_path(input);
    let cmd = fast_start_command(input, &output);

    let result = runner
        .run_with_progress(&cmd, |progress| {
            debug!(
                out_time_ms = progress.out_time_ms,
                total_size = progress.total_size,
                speed = progress.speed,
                complete = progress.is_complete,
                "Fast-start progress"
            );
        })
        .await;

    if let Err(e) = result {
        if let Err(rm) = tokio::fs::remove_file(&output).await {
            if rm.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial output {}: {}", output.display(), rm);
            }
        }
        return Err(e);
    }

    if !output.exists() {
        return Err(MediaError::ffmpeg_failed(
            "FFmpeg produced no output file",
            None,
            Some(0),
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_distinct() {
        let input = Path::new("/tmp/scratch/upload.mp4");
        let output = fast_start_output_path(input);
        assert_eq!(output, PathBuf::from("/tmp/scratch/upload.mp4.processing"));
        assert_ne!(output, input);
    }

    #[test]
    fn test_command_is_stream_copy() {
        let cmd = fast_start_command(Path::new("in.mp4"), Path::new("in.mp4.processing"));
        let args = cmd.build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-c copy"));
        assert!(joined.contains("-movflags faststart"));
        assert!(joined.contains("-f mp4"));
        assert!(!joined.contains("-c:v"));
        assert_eq!(args.last().map(String::as_str), Some("in.mp4.processing"));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let runner = FfmpegRunner::new();
        let result = rewrite_for_fast_start(Path::new("/no/such/upload.mp4"), &runner).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
