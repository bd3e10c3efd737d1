use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use crate::models::Contour;

/// Outermost contours of the foreground (non-zero) regions of a binary image.
///
/// Holes, and anything nested inside another region, are skipped.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn line_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let norm = (dx * dx + dy * dy).sqrt();
    if norm == 0.0 {
        return distance(p, a);
    }
    ((p.x - a.x) as f64 * dy - (p.y - a.y) as f64 * dx).abs() / norm
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = distance(*p, origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Douglas-Peucker on an open chain. Both endpoints are always kept.
fn simplify_chain(chain: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if chain.len() < 3 {
        return chain.to_vec();
    }

    let last = chain.len() - 1;
    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut split = start;
        let mut max_dist = 0.0;
        for i in start + 1..end {
            let d = line_distance(chain[i], chain[start], chain[end]);
            if d > max_dist {
                max_dist = d;
                split = i;
            }
        }

        if max_dist > epsilon {
            keep[split] = true;
            stack.push((split, end));
            stack.push((start, split));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a contour to a polygon whose edges deviate at most `epsilon` from it.
///
/// Closed curves are split at two mutually distant points and each half is
/// simplified separately, so the result does not depend on where tracing began.
pub fn approximate_polygon(points: &[Point<i32>], epsilon: f64, closed: bool) -> Vec<Point<i32>> {
    if !closed || points.len() < 3 {
        return simplify_chain(points, epsilon);
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return vec![points[start]];
    }

    let first = simplify_chain(&points[start..=end], epsilon);

    let mut wrapped: Vec<Point<i32>> = points[end..].to_vec();
    wrapped.extend_from_slice(&points[..=start]);
    let second = simplify_chain(&wrapped, epsilon);

    // Drop the shared endpoints of the second half.
    let mut polygon = first;
    if second.len() > 2 {
        polygon.extend_from_slice(&second[1..second.len() - 1]);
    }
    polygon
}
