//! FFprobe stream inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Stream metadata reported by the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream type ("video", "audio", "data", ...)
    #[serde(default)]
    pub codec_type: String,
    /// Width in pixels (video streams only)
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels (video streams only)
    #[serde(default)]
    pub height: Option<u32>,
}

impl StreamInfo {
    /// Dimensions if this is a video stream with positive width and height.
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        if self.codec_type != "video" {
            return None;
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Parsed probe output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

impl ProbeReport {
    /// Parse FFprobe JSON output.
    pub fn from_json(bytes: &[u8]) -> MediaResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Dimensions of the first qualifying video stream.
    pub fn first_video_dimensions(&self) -> Option<(u32, u32)> {
        self.streams.iter().find_map(StreamInfo::video_dimensions)
    }
}

/// Probe a media file for its streams.
///
/// Output is captured in memory; nothing is written to disk.
pub async fn probe_streams(path: impl AsRef<Path>, timeout: Option<Duration>) -> MediaResult<ProbeReport> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, output)
            .await
            .map_err(|_| MediaError::Timeout(limit.as_secs()))??,
        None => output.await?,
    };

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    ProbeReport::from_json(&output.stdout)
}
