use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::config::LocatorParams;

/// Canny edges of the photo after smoothing away paper grain.
pub fn edge_map(gray: &GrayImage, params: &LocatorParams) -> GrayImage {
    let smoothed = gaussian_blur_f32(gray, params.blur_sigma);
    canny(&smoothed, params.canny_low, params.canny_high)
}

/// Inverted binary threshold at the Otsu level.
///
/// Ink (dark) pixels become 255 and paper becomes 0, so filled bubbles
/// carry high foreground counts.
pub fn binarize_inverted(img: &GrayImage) -> GrayImage {
    threshold(img, otsu_level(img), ThresholdType::BinaryInverted)
}

/// Zero every foreground component that touches the image border.
pub fn clear_border(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return binary.clone();
    }

    let labeled = connected_components(binary, Connectivity::Eight, Luma([0]));

    let mut touching = std::collections::HashSet::new();
    for x in 0..width {
        touching.insert(labeled.get_pixel(x, 0)[0]);
        touching.insert(labeled.get_pixel(x, height - 1)[0]);
    }
    for y in 0..height {
        touching.insert(labeled.get_pixel(0, y)[0]);
        touching.insert(labeled.get_pixel(width - 1, y)[0]);
    }
    touching.remove(&0);

    if touching.is_empty() {
        return binary.clone();
    }

    GrayImage::from_fn(width, height, |x, y| {
        if touching.contains(&labeled.get_pixel(x, y)[0]) {
            Luma([0])
        } else {
            *binary.get_pixel(x, y)
        }
    })
}
