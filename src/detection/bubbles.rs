use image::GrayImage;
use tracing::debug;

use crate::config::SegmenterParams;
use crate::detection::{contours, preprocessing};
use crate::error::{GradeError, Result};
use crate::models::{Bubble, Contour};

/// Binarized sheet plus the bubble candidates found on it.
pub struct SegmentedSheet {
    pub thresh: GrayImage,
    pub bubbles: Vec<Bubble>,
}

/// Whether a contour's bounding box looks like an answer bubble
pub fn is_bubble(contour: &Contour, params: &SegmenterParams) -> bool {
    let bbox = contour.bounding_box();
    let aspect = bbox.aspect_ratio();
    bbox.width >= params.min_width
        && bbox.height >= params.min_height
        && aspect >= params.min_aspect
        && aspect <= params.max_aspect
}

/// Filter contours to keep only bubble-shaped ones
pub fn filter_bubbles(contours: Vec<Contour>, params: &SegmenterParams) -> Vec<Bubble> {
    contours
        .into_iter()
        .filter(|c| is_bubble(c, params))
        .map(Bubble::from_contour)
        .collect()
}

/// Binarize a rectified grayscale sheet and pick out its bubbles.
pub fn segment_sheet(warped: &GrayImage, params: &SegmenterParams) -> Result<SegmentedSheet> {
    let binary = preprocessing::binarize_inverted(warped);
    let thresh = if params.clear_border {
        preprocessing::clear_border(&binary)
    } else {
        binary
    };

    let found = contours::find_external_contours(&thresh);
    let bubbles = filter_bubbles(found, params);
    debug!(bubbles = bubbles.len(), "Bubble candidates after size filter");

    if bubbles.is_empty() {
        return Err(GradeError::NoBubblesFound);
    }

    Ok(SegmentedSheet { thresh, bubbles })
}
