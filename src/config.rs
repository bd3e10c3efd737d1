use std::path::Path;

use crate::error::{GradeError, Result};
use crate::models::AnswerKey;

/// Parameters for finding the sheet outline in the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorParams {
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_ratio: f64,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 75.0,
            canny_high: 200.0,
            approx_epsilon_ratio: 0.02,
        }
    }
}

/// Parameters for picking bubbles out of the rectified sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterParams {
    pub min_width: u32,
    pub min_height: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Drop foreground touching the sheet border before tracing contours.
    pub clear_border: bool,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            min_width: 20,
            min_height: 20,
            min_aspect: 0.9,
            max_aspect: 1.1,
            clear_border: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineParams {
    pub locator: LocatorParams,
    pub segmenter: SegmenterParams,
}

/// Load an answer key from a JSON object such as `{"0": "B", "1": 4}`.
pub fn load_answer_key(path: &Path) -> Result<AnswerKey> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        GradeError::InvalidConfig(format!("failed to read answer key {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        GradeError::InvalidConfig(format!("malformed answer key {}: {}", path.display(), e))
    })
}
