//! Boundary ordering: the sequence in which boundary pixels reach the
//! simplifier.
//!
//! This module defines the [`BoundaryOrder`] trait for pluggable ordering
//! strategies and the [`BoundaryOrderKind`] enum for selecting one at
//! runtime.
//!
//! # Strategy pattern
//!
//! Ramer-Douglas-Peucker treats its first and last input points as a
//! segment, so the order of the boundary pixels decides the shape of the
//! simplified outline. Existing sidecar files were produced from the
//! row-major scan order, which zigzags across the shape; a traced
//! perimeter walk simplifies to a handful of corners instead.

use serde::{Deserialize, Serialize};

use crate::edge;
use crate::types::{BinaryMask, PixelPoint};

/// Selects how boundary pixels are ordered before simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryOrderKind {
    /// Row-major scan order of the 8-neighbour boundary pixel set.
    ///
    /// Matches the outlines already stored in sidecar files.
    #[default]
    ScanOrder,

    /// Suzuki-Abe border following via `imageproc::contours::find_contours`.
    ///
    /// Each traced border (outer borders and holes) is emitted as one
    /// run, in the order `imageproc` discovers them.
    Traced,
}

/// Trait for boundary ordering strategies.
///
/// Input: a filled binary mask. Output: its boundary pixels in the
/// order the simplifier should see them, in the mask's own space.
pub trait BoundaryOrder {
    /// Extract and order the boundary pixels of `mask`.
    fn order(&self, mask: &BinaryMask) -> Vec<PixelPoint>;
}

impl BoundaryOrder for BoundaryOrderKind {
    fn order(&self, mask: &BinaryMask) -> Vec<PixelPoint> {
        match *self {
            Self::ScanOrder => edge::boundary_pixels(mask),
            Self::Traced => trace_border_following(mask),
        }
    }
}

fn trace_border_following(mask: &BinaryMask) -> Vec<PixelPoint> {
    let contours: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(mask.as_gray());

    contours
        .into_iter()
        .flat_map(|c| c.points)
        .map(|p| PixelPoint::new(p.x, p.y))
        .collect()
}
