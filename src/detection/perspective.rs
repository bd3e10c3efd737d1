use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::point::Point;
use tracing::{debug, warn};

use crate::error::{GradeError, Result};
use crate::models::Quadrilateral;

/// Order four corners as top-left, top-right, bottom-right, bottom-left.
///
/// Top-left has the smallest `x + y` and bottom-right the largest; top-right
/// has the smallest `y - x` and bottom-left the largest. Ties keep the first
/// corner seen.
pub fn order_corners(corners: &[Point<i32>; 4]) -> [Point<i32>; 4] {
    let sum = |p: &Point<i32>| p.x + p.y;
    let diff = |p: &Point<i32>| p.y - p.x;

    [
        extreme_corner(corners, sum, false),
        extreme_corner(corners, diff, false),
        extreme_corner(corners, sum, true),
        extreme_corner(corners, diff, true),
    ]
}

fn extreme_corner(
    corners: &[Point<i32>; 4],
    key: impl Fn(&Point<i32>) -> i32,
    largest: bool,
) -> Point<i32> {
    let mut best = corners[0];
    for p in &corners[1..] {
        let better = if largest { key(p) > key(&best) } else { key(p) < key(&best) };
        if better {
            best = *p;
        }
    }
    best
}

fn edge_length(a: Point<i32>, b: Point<i32>) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Output size for ordered corners: the longer of each pair of opposite edges.
pub fn target_size(ordered: &[Point<i32>; 4]) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered;
    let width = edge_length(br, bl).max(edge_length(tr, tl));
    let height = edge_length(tr, br).max(edge_length(tl, bl));
    (width.round() as u32, height.round() as u32)
}

/// Maps a located sheet outline onto an axis-aligned rectangle.
pub struct Rectifier {
    projection: Projection,
    width: u32,
    height: u32,
}

impl Rectifier {
    pub fn new(outline: &Quadrilateral) -> Result<Self> {
        let ordered = order_corners(&outline.corners);
        let (width, height) = target_size(&ordered);

        if width < 2 || height < 2 {
            warn!(width, height, "Document outline is degenerate");
            return Err(GradeError::DocumentNotFound);
        }

        let src = ordered.map(|p| (p.x as f32, p.y as f32));
        let (w, h) = ((width - 1) as f32, (height - 1) as f32);
        let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            warn!(corners = ?ordered, "No projective transform for document outline");
            GradeError::DocumentNotFound
        })?;

        debug!(width, height, "Rectified sheet size");
        Ok(Self { projection, width, height })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn warp_gray(&self, image: &GrayImage) -> GrayImage {
        let mut out = GrayImage::new(self.width, self.height);
        warp_into(image, &self.projection, Interpolation::Bilinear, Luma([0]), &mut out);
        out
    }

    pub fn warp_rgb(&self, image: &RgbImage) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        warp_into(image, &self.projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
        out
    }
}
