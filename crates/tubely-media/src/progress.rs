//! FFmpeg progress parsing.

/// Progress information from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Total bytes written so far
    pub total_size: u64,
    /// Processing speed (e.g., 40.0 = 40x realtime)
    pub speed: f64,
    /// Whether processing is complete
    pub is_complete: bool,
}

/// Parse a progress line, updating `current`.
///
/// Returns a snapshot at the end of each progress block.
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_us" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "total_size" => {
            if let Ok(size) = value.parse() {
                current.total_size = size;
            }
        }
        "speed" => {
            // "40.5x" or "N/A"
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }

    None
}

/// Whether a stderr line is part of the `-progress` key=value stream.
pub(crate) fn is_progress_field(line: &str) -> bool {
    line.trim()
        .split_once('=')
        .map(|(key, _)| !key.is_empty() && !key.contains(char::is_whitespace))
        .unwrap_or(false)
}
