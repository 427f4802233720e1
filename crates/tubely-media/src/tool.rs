//! Media tool capability.
//!
//! The ingest pipeline only needs two operations from a media toolkit:
//! inspect a file's streams and rewrite it for streaming. [`MediaTool`] is the
//! seam; [`FfmpegTool`] is the CLI-backed implementation.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use tracing::{debug, info};

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::MediaResult;
use crate::faststart::rewrite_for_fast_start;
use crate::probe::{probe_streams, ProbeReport};

/// Metric names for media tool invocations.
pub mod names {
    pub const FFPROBE_DURATION_SECONDS: &str = "tubely_ffprobe_duration_seconds";
    pub const FFMPEG_DURATION_SECONDS: &str = "tubely_ffmpeg_duration_seconds";
}

/// Media inspection and repackaging operations.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Report the streams of a local file.
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport>;

    /// Produce a fast-start copy of `input` at a new path.
    async fn rewrite_for_streaming(&self, input: &Path) -> MediaResult<PathBuf>;

    /// Verify the underlying tooling is usable.
    fn check_available(&self) -> MediaResult<()> {
        Ok(())
    }
}

/// [`MediaTool`] backed by the `ffprobe` and `ffmpeg` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTool {
    timeout_secs: Option<u64>,
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill either process if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        match self.timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport> {
        let start = Instant::now();
        let result = probe_streams(path, self.timeout_secs.map(Duration::from_secs)).await;
        let elapsed = start.elapsed();

        histogram!(names::FFPROBE_DURATION_SECONDS).record(elapsed.as_secs_f64());
        debug!(path = %path.display(), elapsed_ms = elapsed.as_millis() as u64, "Probed media file");

        result
    }

    async fn rewrite_for_streaming(&self, input: &Path) -> MediaResult<PathBuf> {
        let start = Instant::now();
        let result = rewrite_for_fast_start(input, &self.runner()).await;
        let elapsed = start.elapsed();

        histogram!(names::FFMPEG_DURATION_SECONDS, "operation" => "faststart")
            .record(elapsed.as_secs_f64());

        if let Ok(output) = &result {
            info!(
                input = %input.display(),
                output = %output.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Rewrote media for fast start"
            );
        }

        result
    }

    fn check_available(&self) -> MediaResult<()> {
        check_ffprobe()?;
        check_ffmpeg()?;
        Ok(())
    }
}
