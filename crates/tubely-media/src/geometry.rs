//! Geometry classification of uploaded media.

use std::path::Path;

use tubely_models::GeometryCategory;

use crate::error::{MediaError, MediaResult};
use crate::probe::ProbeReport;
use crate::tool::MediaTool;

/// Classify a probe report by its first usable video stream.
pub fn classify_report(report: &ProbeReport) -> MediaResult<GeometryCategory> {
    let (width, height) = report
        .first_video_dimensions()
        .ok_or(MediaError::NoVideoStream)?;

    Ok(GeometryCategory::from_dimensions(width, height))
}

/// Probe a local file and classify its geometry.
///
/// Read-only: the file is inspected but never modified.
pub async fn classify_geometry(tool: &dyn MediaTool, path: &Path) -> MediaResult<GeometryCategory> {
    let report = tool.probe(path).await?;
    classify_report(&report)
}
