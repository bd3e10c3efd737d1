use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::models::{Answer, Bubble, Choice, Question};

/// Foreground pixels of `thresh` inside the filled bubble contour.
pub fn filled_pixels(thresh: &GrayImage, bubble: &Bubble) -> u32 {
    let bbox = bubble.bbox;
    if bbox.width == 0 || bbox.height == 0 {
        return 0;
    }

    // Mask covers only the bounding box; contour points are shifted into it.
    let mut mask = GrayImage::new(bbox.width, bbox.height);
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(bubble.contour.points.len());
    for p in &bubble.contour.points {
        let local = Point::new(p.x - bbox.x, p.y - bbox.y);
        if poly.last() != Some(&local) {
            poly.push(local);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    if poly.len() >= 3 {
        draw_polygon_mut(&mut mask, &poly, Luma([255]));
    } else {
        for p in &poly {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
        }
    }

    let mut count = 0;
    for (mx, my, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let x = bbox.x + mx as i32;
        let y = bbox.y + my as i32;
        if x < 0 || y < 0 || x as u32 >= thresh.width() || y as u32 >= thresh.height() {
            continue;
        }
        if thresh.get_pixel(x as u32, y as u32)[0] != 0 {
            count += 1;
        }
    }
    count
}

/// Index of the largest count. On ties the earliest index wins.
pub fn most_filled(counts: &[u32]) -> Option<usize> {
    let mut best: Option<(u32, usize)> = None;
    for (i, &total) in counts.iter().enumerate() {
        match best {
            Some((max, _)) if total <= max => {}
            _ => best = Some((total, i)),
        }
    }
    best.map(|(_, i)| i)
}

/// Read one question: the most filled bubble, or `Unanswered` if the
/// question lacks any of its bubbles.
pub fn select_answer(thresh: &GrayImage, question: &Question) -> Answer {
    if !question.is_complete() {
        return Answer::Unanswered;
    }

    let counts: Vec<u32> = question
        .bubbles
        .iter()
        .map(|b| filled_pixels(thresh, b))
        .collect();

    most_filled(&counts)
        .and_then(Choice::from_index)
        .map_or(Answer::Unanswered, Answer::Marked)
}
