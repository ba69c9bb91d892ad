//! Outline simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces the boundary point list by removing points within a given
//! tolerance of the segment between their retained neighbours. The
//! first and last input points are always kept, and the input order is
//! taken as given: the simplifier does not assume the points form a
//! walked perimeter.

use crate::types::{PixelPoint, RegionError};

/// Added to the squared segment length so zero-length segments divide
/// safely.
const DEGENERATE_GUARD: f64 = 1e-9;

/// Simplify an ordered point list using Ramer-Douglas-Peucker.
///
/// Points within `epsilon` of the segment between their endpoints are
/// removed; a point is kept only when its distance strictly exceeds
/// `epsilon`. Lists with fewer than 3 points are returned unchanged.
///
/// The result is a subsequence of the input and a fixed point of this
/// function for the same `epsilon`.
#[must_use = "returns the simplified points"]
pub fn simplify(points: &[PixelPoint], epsilon: f64) -> Vec<PixelPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, epsilon, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Like [`simplify`], but reports inputs too short to describe an outline.
///
/// # Errors
///
/// Returns [`RegionError::TooFewPoints`] when `points` has fewer than two
/// entries.
pub fn simplify_checked(points: &[PixelPoint], epsilon: f64) -> Result<Vec<PixelPoint>, RegionError> {
    if points.len() < 2 {
        return Err(RegionError::TooFewPoints {
            count: points.len(),
        });
    }
    Ok(simplify(points, epsilon))
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the first point between `start` and `end` farthest from the
/// segment between them. If that distance exceeds `epsilon`, the point
/// is kept and both halves are processed recursively.
fn rdp_recurse(points: &[PixelPoint], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = segment_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, epsilon, kept);
        rdp_recurse(points, max_idx, end, epsilon, kept);
    }
}

/// Distance from `p` to the closed segment `a`-`b`.
///
/// Projects `p` onto the segment, clamping the projection parameter to
/// `[0, 1]`. When `a` and `b` coincide this is the distance to `a`.
#[must_use]
pub fn segment_distance(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let (px, py) = p.to_f64();
    let (ax, ay) = a.to_f64();
    let (bx, by) = b.to_f64();
    let dx = bx - ax;
    let dy = by - ay;
    let length_sq = dx.mul_add(dx, dy * dy) + DEGENERATE_GUARD;

    let t = (px - ax).mul_add(dx, (py - ay) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let cx = t.mul_add(dx, ax);
    let cy = t.mul_add(dy, ay);
    (px - cx).hypot(py - cy)
}
