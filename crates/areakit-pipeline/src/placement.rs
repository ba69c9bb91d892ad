//! Placing a descriptor in world space for hit and overlap tests.
//!
//! A [`PlacedRegion`] pins a descriptor's anchor to a world position.
//! Moving the region moves the anchor; the outline follows. Polygon
//! tests go through `geo` and treat the outline boundary as inside.

use geo::{BoundingRect, Intersects, LineString, Point, Polygon};

use crate::types::{EllipseOffsets, PixelPoint, RegionDescriptor};

/// A region descriptor positioned in world coordinates.
#[derive(Debug, Clone)]
pub struct PlacedRegion {
    offsets: Vec<PixelPoint>,
    ellipse: Option<EllipseOffsets>,
    position: PixelPoint,
}

impl PlacedRegion {
    /// Place `descriptor` with its anchor at world `position`.
    #[must_use]
    pub fn new(descriptor: &RegionDescriptor, position: PixelPoint) -> Self {
        Self {
            offsets: descriptor.points.clone(),
            ellipse: descriptor.ellipse,
            position,
        }
    }

    /// World position of the anchor.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Move by `(dx, dy)`.
    pub const fn translate(&mut self, dx: i32, dy: i32) {
        self.position = self.position.offset_by(PixelPoint::new(dx, dy));
    }

    /// Move the anchor to `(x, y)`.
    pub const fn set_position(&mut self, x: i32, y: i32) {
        self.position = PixelPoint::new(x, y);
    }

    /// Outline points in world coordinates.
    #[must_use]
    pub fn points(&self) -> Vec<PixelPoint> {
        self.offsets
            .iter()
            .map(|&p| p.offset_by(self.position))
            .collect()
    }

    /// Inclusive world-space bounds `(min, max)`, or `None` for an empty
    /// outline without ellipse geometry.
    #[must_use]
    pub fn bounds(&self) -> Option<(PixelPoint, PixelPoint)> {
        if let Some(e) = self.ellipse {
            let center = PixelPoint::new(e.x, e.y).offset_by(self.position);
            let half_w = crate::types::to_i32(e.w / 2);
            let half_h = crate::types::to_i32(e.h / 2);
            return Some((
                PixelPoint::new(center.x - half_w, center.y - half_h),
                PixelPoint::new(center.x + half_w, center.y + half_h),
            ));
        }
        let rect = self.polygon().bounding_rect()?;
        Some((
            PixelPoint::new(
                crate::normalize::round_to_i32(rect.min().x),
                crate::normalize::round_to_i32(rect.min().y),
            ),
            PixelPoint::new(
                crate::normalize::round_to_i32(rect.max().x),
                crate::normalize::round_to_i32(rect.max().y),
            ),
        ))
    }

    /// Whether world point `p` lies inside or on the region.
    ///
    /// Ellipse regions use the ellipse equation; other regions test
    /// against the outline polygon.
    #[must_use]
    pub fn contains_point(&self, p: PixelPoint) -> bool {
        if let Some(e) = self.ellipse {
            let (px, py) = p.relative_to(self.position).to_f64();
            let rx = f64::from(e.w) / 2.0;
            let ry = f64::from(e.h) / 2.0;
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            let nx = (px - f64::from(e.x)) / rx;
            let ny = (py - f64::from(e.y)) / ry;
            return nx.mul_add(nx, ny * ny) <= 1.0;
        }
        if self.offsets.is_empty() {
            return false;
        }
        let (x, y) = p.to_f64();
        self.polygon().intersects(&Point::new(x, y))
    }

    /// Whether the outlines of two placed regions overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.offsets.is_empty() || other.offsets.is_empty() {
            return false;
        }
        self.polygon().intersects(&other.polygon())
    }

    fn polygon(&self) -> Polygon<f64> {
        let ring: Vec<(f64, f64)> = self.points().into_iter().map(PixelPoint::to_f64).collect();
        Polygon::new(LineString::from(ring), Vec::new())
    }
}
