//! Coordinate conversion between display, original, and anchor-relative
//! space.
//!
//! The interactive canvas shows the frames scaled by a [`ScaleContext`]:
//!
//! ```text
//! display  = original × scale_factor + origin_offset
//! original = round((display − origin_offset) / scale_factor)
//! ```
//!
//! Canvas coordinates are display coordinates with the offset removed;
//! session inputs and masks built at canvas size use them.
//!
//! Rounding is half away from zero (`f64::round`) everywhere, so a
//! display → original → display round trip drifts by at most one pixel.
//!
//! Anchor-relative offsets are plain integer differences from the anchor
//! pixel and convert back exactly.

use serde::{Deserialize, Serialize};

use crate::types::{BinaryMask, Dimensions, PixelPoint, RegionError};

/// Largest canvas the interactive view fits frames into.
pub const DEFAULT_MAX_DISPLAY: Dimensions = Dimensions::new(800, 600);

/// Explicit display-vs-original scaling, passed to every conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleContext {
    /// Display pixels per original pixel.
    pub scale_factor: f64,
    /// Display-space position of the original image's top-left corner.
    #[serde(default)]
    pub origin_offset: PixelPoint,
}

impl ScaleContext {
    /// A context with the given factor and no offset.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] unless `scale_factor` is
    /// finite and strictly positive.
    pub fn new(scale_factor: f64) -> Result<Self, RegionError> {
        let ctx = Self {
            scale_factor,
            origin_offset: PixelPoint::default(),
        };
        ctx.validate()?;
        Ok(ctx)
    }

    /// Display and original space coincide.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            scale_factor: 1.0,
            origin_offset: PixelPoint::new(0, 0),
        }
    }

    /// Largest factor `<= 1` that fits `original` inside `max`.
    ///
    /// Never upscales. Degenerate originals get the identity.
    #[must_use]
    pub fn fit(original: Dimensions, max: Dimensions) -> Self {
        if original.is_empty() {
            return Self::identity();
        }
        let sx = f64::from(max.width) / f64::from(original.width);
        let sy = f64::from(max.height) / f64::from(original.height);
        let scale_factor = 1.0_f64.min(sx).min(sy);
        if scale_factor > 0.0 {
            Self {
                scale_factor,
                origin_offset: PixelPoint::default(),
            }
        } else {
            Self::identity()
        }
    }

    /// Check that the factor is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] unless `scale_factor` is
    /// finite and strictly positive.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            Ok(())
        } else {
            Err(RegionError::InvalidParameter(format!(
                "scale factor must be finite and positive, got {}",
                self.scale_factor
            )))
        }
    }

    /// Canvas size for frames of size `original`.
    ///
    /// Each side is truncated toward zero and kept at least one pixel.
    #[must_use]
    pub fn display_dimensions(&self, original: Dimensions) -> Dimensions {
        let side = |v: u32| -> u32 {
            let scaled = (f64::from(v) * self.scale_factor).floor();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let scaled = scaled.clamp(1.0, f64::from(u32::MAX)) as u32;
            scaled
        };
        Dimensions::new(side(original.width), side(original.height))
    }

    /// Display-space point to canvas coordinates, where `(0, 0)` is the
    /// image's top-left corner.
    #[must_use]
    pub const fn to_canvas(&self, p: PixelPoint) -> PixelPoint {
        p.relative_to(self.origin_offset)
    }

    /// Canvas point to the nearest original-space pixel.
    #[must_use]
    pub fn canvas_to_original(&self, p: PixelPoint) -> PixelPoint {
        let (x, y) = p.to_f64();
        PixelPoint::new(
            round_to_i32(x / self.scale_factor),
            round_to_i32(y / self.scale_factor),
        )
    }

    /// Display-space point to the nearest original-space pixel.
    #[must_use]
    pub fn display_to_original(&self, p: PixelPoint) -> PixelPoint {
        self.canvas_to_original(self.to_canvas(p))
    }

    /// Original-space pixel to the nearest display-space point.
    #[must_use]
    pub fn original_to_display(&self, p: PixelPoint) -> PixelPoint {
        let (x, y) = p.to_f64();
        PixelPoint::new(
            round_to_i32(x * self.scale_factor),
            round_to_i32(y * self.scale_factor),
        )
        .offset_by(self.origin_offset)
    }

    /// A display-space length in original pixels.
    #[must_use]
    pub fn length_to_original(&self, length: f64) -> f64 {
        length / self.scale_factor
    }
}

impl Default for ScaleContext {
    fn default() -> Self {
        Self::identity()
    }
}

/// Round half away from zero and saturate into `i32`.
#[must_use]
pub fn round_to_i32(v: f64) -> i32 {
    let r = v.round();
    if r.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let r = r.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
    r
}

/// How the session's anchor pixel is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// Midpoint of the image's bottom edge: `(width / 2, height)`.
    #[default]
    ImageBottomCenter,

    /// Horizontal midpoint of the opaque region's bounding box, on its
    /// lowest opaque row.
    OpaqueBottomCenter,
}

/// Compute the anchor in original space.
///
/// `union` is the alpha-union mask of the frame stack. When the strategy
/// needs opaque pixels and there are none, the image bottom-center is
/// used instead.
#[must_use]
pub fn anchor_point(strategy: AnchorStrategy, dimensions: Dimensions, union: &BinaryMask) -> PixelPoint {
    let image_bottom_center = || {
        PixelPoint::new(
            crate::types::to_i32(dimensions.width / 2),
            crate::types::to_i32(dimensions.height),
        )
    };
    match strategy {
        AnchorStrategy::ImageBottomCenter => image_bottom_center(),
        AnchorStrategy::OpaqueBottomCenter => match union.bounding_box() {
            Some((lo, hi)) => {
                let mid = (f64::from(lo.x) + f64::from(hi.x)) / 2.0;
                PixelPoint::new(round_to_i32(mid), hi.y)
            }
            None => {
                tracing::warn!("no opaque pixels for anchor, using image bottom-center");
                image_bottom_center()
            }
        },
    }
}

/// Express `p` as an offset from `anchor`.
#[must_use]
pub const fn to_anchor_relative(p: PixelPoint, anchor: PixelPoint) -> PixelPoint {
    p.relative_to(anchor)
}

/// Recover an absolute original-space point from an anchor offset.
#[must_use]
pub const fn from_anchor_relative(offset: PixelPoint, anchor: PixelPoint) -> PixelPoint {
    offset.offset_by(anchor)
}
