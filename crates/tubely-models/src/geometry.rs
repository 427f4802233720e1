//! Aspect-ratio classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference ratio for landscape video (16:9).
pub const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;

/// Reference ratio for portrait video (9:16).
pub const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Absolute tolerance when comparing a measured ratio to a reference ratio.
pub const RATIO_TOLERANCE: f64 = 0.01;

/// Coarse geometry of a video, used only to pick a storage folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeometryCategory {
    /// ~16:9
    Landscape,
    /// ~9:16
    Portrait,
    /// Anything else, including undetectable geometry
    #[default]
    Other,
}

impl GeometryCategory {
    /// Classify from pixel dimensions.
    ///
    /// Zero dimensions classify as `Other`; callers that need to tell
    /// "no usable stream" apart should check before calling.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return GeometryCategory::Other;
        }

        let ratio = width as f64 / height as f64;

        if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            GeometryCategory::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            GeometryCategory::Portrait
        } else {
            GeometryCategory::Other
        }
    }

    /// Storage folder name for this category.
    pub fn folder(&self) -> &'static str {
        match self {
            GeometryCategory::Landscape => "landscape",
            GeometryCategory::Portrait => "portrait",
            GeometryCategory::Other => "other",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.folder()
    }
}

impl fmt::Display for GeometryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
