use image::GrayImage;
use tracing::debug;

use crate::config::LocatorParams;
use crate::detection::{contours, preprocessing};
use crate::error::{GradeError, Result};
use crate::models::{Contour, Quadrilateral};

/// Edge map plus the document outline found in it.
pub struct LocatedDocument {
    pub edges: GrayImage,
    pub outline: Quadrilateral,
}

/// Find the answer sheet in a grayscale photo.
///
/// The sheet is taken to be the largest external edge contour that
/// simplifies to exactly four vertices.
pub fn locate_document(gray: &GrayImage, params: &LocatorParams) -> Result<LocatedDocument> {
    let edges = preprocessing::edge_map(gray, params);

    let found = contours::find_external_contours(&edges);
    debug!(contours = found.len(), "Edge contours found");

    let outline = find_quadrilateral(found, params.approx_epsilon_ratio)
        .ok_or(GradeError::DocumentNotFound)?;

    debug!(corners = ?outline.corners, "Document outline located");
    Ok(LocatedDocument { edges, outline })
}

/// Largest-first scan for a contour whose polygon approximation has four vertices.
pub fn find_quadrilateral(candidates: Vec<Contour>, epsilon_ratio: f64) -> Option<Quadrilateral> {
    let mut by_area: Vec<(f64, Contour)> = candidates.into_iter().map(|c| (c.area(), c)).collect();
    // Stable, so equal areas keep tracing order.
    by_area.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (area, contour) in by_area {
        let epsilon = epsilon_ratio * contour.perimeter();
        if epsilon <= 0.0 {
            continue;
        }

        let approx = contours::approximate_polygon(&contour.points, epsilon, true);
        if let &[a, b, c, d] = approx.as_slice() {
            debug!(area, "Accepted four-vertex contour");
            return Some(Quadrilateral { corners: [a, b, c, d] });
        }
    }

    None
}
