//! Boundary extraction from a filled binary mask.
//!
//! An occupied pixel is a boundary pixel when at least one of its eight
//! neighbours is free or lies outside the grid. Equivalently, the
//! boundary is `mask AND NOT erode(mask, 1)` with the grid edge treated
//! as free space.
//!
//! The result is returned in row-major scan order. It is a point set,
//! not a walked contour; see [`crate::contour`] for perimeter ordering.

use crate::types::{BinaryMask, PixelPoint};

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Whether the occupied pixel at `(x, y)` touches free space.
fn touches_free(mask: &BinaryMask, x: i64, y: i64) -> bool {
    NEIGHBOURS
        .iter()
        .any(|&(dx, dy)| !mask.get(x + dx, y + dy))
}

/// Boundary pixels of `mask`, in row-major scan order.
///
/// Coordinates are in the mask's own space. An empty mask yields an
/// empty vector.
#[must_use = "returns the boundary pixels"]
pub fn boundary_pixels(mask: &BinaryMask) -> Vec<PixelPoint> {
    mask.occupied()
        .filter(|p| touches_free(mask, i64::from(p.x), i64::from(p.y)))
        .collect()
}

/// Boundary pixels of `mask` as a mask of the same size and space.
#[must_use = "returns the boundary mask"]
pub fn boundary_mask(mask: &BinaryMask) -> BinaryMask {
    let mut out = BinaryMask::new(mask.dimensions(), mask.space());
    for p in boundary_pixels(mask) {
        if let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y)) {
            out.set(x, y, true);
        }
    }
    out
}
