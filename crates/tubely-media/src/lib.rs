#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the ingest pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeout support via tokio
//! - Stream inspection with FFprobe and geometry classification
//! - Fast-start rewriting (stream copy, index moved to the front)
//! - The [`MediaTool`] capability used by the upload pipeline

pub mod command;
pub mod error;
pub mod faststart;
pub mod geometry;
pub mod probe;
pub mod progress;
pub mod tool;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use faststart::{fast_start_output_path, rewrite_for_fast_start, FASTSTART_SUFFIX};
pub use geometry::{classify_geometry, classify_report};
pub use probe::{probe_streams, ProbeReport, StreamInfo};
pub use progress::FfmpegProgress;
pub use tool::{FfmpegTool, MediaTool};
